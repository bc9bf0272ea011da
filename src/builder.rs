use std::fmt;
use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::dock;
use crate::error::{DockconfError, Result};
use crate::key::{Key, KeyId, KeyMut, KeyRef};
use crate::keyfile::KeyFile;
use crate::persist::{SaveOutcome, SavePolicy};
use crate::report;
use crate::source::Source;
use crate::storage::Storage;
use crate::types::KeyType;
use crate::value::{FromValue, Value};
use crate::view::{Page, PageItem, ViewFactories};

/// Translation hook: `(domain, text) → translated text`.
pub type Translator = Rc<dyn Fn(&str, &str) -> String>;

/// Host services shared by every key of a builder.
///
/// Defaults: virtual save policy, identity translation, no gettext domain and
/// [`ViewFactories::headless`].
#[derive(Clone)]
pub struct BuildContext {
    source: Rc<dyn Source>,
    policy: SavePolicy,
    translator: Translator,
    domain: String,
    factories: ViewFactories,
}

impl BuildContext {
    pub fn new(source: Rc<dyn Source>) -> Self {
        Self {
            source,
            policy: SavePolicy::default(),
            translator: Rc::new(|_, text| text.to_string()),
            domain: String::new(),
            factories: ViewFactories::headless(),
        }
    }

    pub fn save_policy(mut self, policy: SavePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn translator(mut self, tr: impl Fn(&str, &str) -> String + 'static) -> Self {
        self.translator = Rc::new(tr);
        self
    }

    /// Gettext domain passed to the translator.
    pub fn gettext_domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    pub fn factories(mut self, factories: ViewFactories) -> Self {
        self.factories = factories;
        self
    }

    pub fn source(&self) -> &Rc<dyn Source> {
        &self.source
    }

    pub fn policy(&self) -> &SavePolicy {
        &self.policy
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("policy", &self.policy)
            .field("domain", &self.domain)
            .field("factories", &self.factories)
            .finish_non_exhaustive()
    }
}

/// Owns the storage and the keys, grouped and ordered.
///
/// Keys live in an arena addressed by [`KeyId`]; groups hold ids in
/// insertion order. Reads route to storage until [`build_page`](Self::build_page)
/// binds a view, and to the view afterwards.
pub struct Builder {
    storage: Box<dyn Storage>,
    ctx: BuildContext,
    keys: Vec<Key>,
    groups: IndexMap<String, Vec<KeyId>>,
    post_save: Option<Box<dyn FnMut()>>,
}

impl Builder {
    pub fn new(storage: impl Storage + 'static, ctx: BuildContext) -> Self {
        Self::with_storage(Box::new(storage), ctx)
    }

    pub fn with_storage(storage: Box<dyn Storage>, ctx: BuildContext) -> Self {
        Self {
            storage,
            ctx,
            keys: Vec::new(),
            groups: IndexMap::new(),
            post_save: None,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn source(&self) -> &Rc<dyn Source> {
        &self.ctx.source
    }

    /// Add a group with its keys. Adding to an existing group appends.
    pub fn add_group(&mut self, group: &str, keys: Vec<Key>) {
        self.groups.entry(group.to_string()).or_default();
        self.add_keys(group, keys);
    }

    /// Append keys to a group, creating it when missing.
    pub fn add_keys(&mut self, group: &str, keys: Vec<Key>) {
        let mut ids = Vec::with_capacity(keys.len());
        for mut key in keys {
            key.nb_elements = key.nb_elements.max(1);
            ids.push(KeyId(self.keys.len()));
            self.keys.push(key);
        }
        self.groups.entry(group.to_string()).or_default().extend(ids);
    }

    /// Add every key the storage lists for `group`.
    pub fn add_group_from_storage(&mut self, group: &str) {
        let keys = self.storage.list(group);
        debug!(group, keys = keys.len(), "group added");
        self.add_group(group, keys);
    }

    pub fn groups(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Keys of a group in insertion order.
    pub fn keys(&self, group: &str) -> Vec<KeyRef<'_>> {
        self.groups
            .get(group)
            .map(|ids| ids.iter().map(|id| KeyRef::new(self, *id)).collect())
            .unwrap_or_default()
    }

    fn find(&self, group: &str, name: &str) -> Option<KeyId> {
        self.groups
            .get(group)?
            .iter()
            .copied()
            .find(|id| self.keys[id.0].name == name)
    }

    pub fn key(&self, group: &str, name: &str) -> Option<KeyRef<'_>> {
        self.find(group, name).map(|id| KeyRef::new(self, id))
    }

    pub fn key_mut(&mut self, group: &str, name: &str) -> Option<KeyMut<'_>> {
        let id = self.find(group, name)?;
        Some(KeyMut::new(self, id))
    }

    /// The key behind an id taken from this builder (for example from a [`Page`]).
    pub fn key_at(&self, id: KeyId) -> Option<KeyRef<'_>> {
        (id.0 < self.keys.len()).then(|| KeyRef::new(self, id))
    }

    pub(crate) fn key_data(&self, id: KeyId) -> &Key {
        &self.keys[id.0]
    }

    pub(crate) fn key_data_mut(&mut self, id: KeyId) -> &mut Key {
        &mut self.keys[id.0]
    }

    /// Apply `f` to a key. A missing key is logged and `false` returned.
    pub fn key_action(&mut self, group: &str, name: &str, f: impl FnOnce(&mut KeyMut<'_>)) -> bool {
        match self.key_mut(group, name) {
            Some(mut key) => {
                f(&mut key);
                true
            }
            None => {
                warn!(group, name, "key action: key not found");
                false
            }
        }
    }

    /// Ids of every key, groups then keys, in insertion order.
    pub fn key_ids(&self) -> Vec<KeyId> {
        self.groups.values().flatten().copied().collect()
    }

    /// Visit every key, groups then keys, in insertion order.
    pub fn key_walk(&self, mut f: impl FnMut(KeyRef<'_>)) {
        for id in self.groups.values().flatten() {
            f(KeyRef::new(self, *id));
        }
    }

    fn key_value<T: FromValue + Default>(&self, group: &str, name: &str) -> T {
        let Some(key) = self.key(group, name) else {
            warn!(group, name, "key value: key not found");
            return T::default();
        };
        key.value_get().unwrap_or_else(|e| {
            warn!(group, name, error = %e, "key value");
            T::default()
        })
    }

    pub fn key_bool(&self, group: &str, name: &str) -> bool {
        self.key_value(group, name)
    }

    pub fn key_int(&self, group: &str, name: &str) -> i64 {
        self.key_value(group, name)
    }

    pub fn key_float(&self, group: &str, name: &str) -> f64 {
        self.key_value(group, name)
    }

    pub fn key_string(&self, group: &str, name: &str) -> String {
        self.key_value(group, name)
    }

    pub fn translate(&self, text: &str) -> String {
        (self.ctx.translator)(&self.ctx.domain, text)
    }

    /// Bind views for a group and return its layout.
    ///
    /// Frames and expanders open a section collecting the following keys
    /// until the next one. Keys gated to another display backend are skipped.
    pub fn build_page(&mut self, group: &str) -> Page {
        let ids = self.groups.get(group).cloned().unwrap_or_default();
        let host_mode = self.ctx.source.display_mode();
        let mut items: Vec<PageItem> = Vec::new();
        let mut section: Option<usize> = None;

        for id in ids {
            let key = &self.keys[id.0];
            if !key.display_mode.allows(host_mode) {
                debug!(key = %key.path(), mode = ?key.display_mode, "key hidden for display mode");
                continue;
            }

            let make = key
                .make_view
                .clone()
                .or_else(|| self.ctx.factories.get(key.key_type).cloned());
            let binding = match make {
                Some(make) => make(&KeyRef::new(self, id)),
                None => {
                    warn!(key = %key.path(), key_type = %key.key_type, "no view factory");
                    None
                }
            };
            self.keys[id.0].binding = binding.map(Rc::new);

            let item = self.layout_item(id);
            match (&item, section) {
                (PageItem::Section { .. }, _) => {
                    items.push(item);
                    section = Some(items.len() - 1);
                }
                (_, Some(idx)) => {
                    if let PageItem::Section { items: inner, .. } = &mut items[idx] {
                        inner.push(item);
                    }
                }
                (_, None) => items.push(item),
            }
        }

        Page {
            group: group.to_string(),
            items,
        }
    }

    fn layout_item(&self, id: KeyId) -> PageItem {
        let key = &self.keys[id.0];
        match key.key_type {
            KeyType::Frame | KeyType::Expander => {
                let title = key
                    .authorised_values
                    .first()
                    .filter(|t| !t.is_empty())
                    .unwrap_or(&key.text);
                PageItem::Section {
                    key: id,
                    expander: key.key_type == KeyType::Expander,
                    title: self.translate(title),
                    icon: key.authorised_values.get(1).cloned().unwrap_or_default(),
                    items: Vec::new(),
                }
            }
            KeyType::Separator => PageItem::Separator { key: id },
            _ => PageItem::Row {
                key: id,
                label: self.translate(&key.text).trim_end_matches(':').to_string(),
                tooltip: if key.tooltip.is_empty() {
                    String::new()
                } else {
                    self.translate(&key.tooltip)
                },
                vertical: key.aligned_vertical,
                full_size: key.key_type.is_full_size(),
                selectable: key.label_selectable,
            },
        }
    }

    /// Commit a key's bound view value to storage.
    ///
    /// Display-only and unbound keys are left untouched. Numbered lists keep
    /// the stored value when the selection is out of the authorised range.
    pub fn update_storage(&mut self, id: KeyId) -> Result<()> {
        let key = &self.keys[id.0];
        if key.key_type.is_display_only() {
            return Ok(());
        }
        let Some(binding) = key.binding.clone() else {
            return Ok(());
        };

        let kind = key.value_kind();
        let value = binding
            .get()
            .coerce(kind)
            .ok_or_else(|| DockconfError::BadTarget {
                key: key.path(),
                expected: kind,
            })?;

        let value = match key.key_type {
            t if t.is_list_numbered() => {
                let choices = match t {
                    KeyType::ListNbCtrlSelect => key.authorised_values.len() / 3,
                    _ => key.authorised_values.len(),
                };
                let index = match &value {
                    Value::Int(i) => *i,
                    _ => 0,
                };
                if choices > 0 && usize::try_from(index).map_or(true, |i| i >= choices) {
                    warn!(key = %key.path(), index, choices, "selection out of range, value kept");
                    return Ok(());
                }
                value
            }
            KeyType::PasswordEntry => match value {
                Value::String(s) => Value::String(self.ctx.source.encrypt_string(&s)),
                other => other,
            },
            KeyType::ListDocks => match dock::resolve_new_dock(self, value) {
                Some(v) => v,
                None => return Ok(()),
            },
            _ => value,
        };

        let key = &self.keys[id.0];
        let (group, name) = (key.group.clone(), key.name.clone());
        self.storage.set(&group, &name, value);
        Ok(())
    }

    /// Save the configuration through the save policy.
    ///
    /// A virtual save returns the change report and writes nothing. Otherwise
    /// views are flushed to storage, the document is rendered and dispatched;
    /// the post-save hook runs only when the file was written.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let path = self.storage.file_path().map(|p| p.to_path_buf());
        let Some(path) = path.filter(|p| !self.ctx.policy.is_virtual(p)) else {
            let report = report::updated_report(self);
            info!(changed = report.changed, total = report.total, "virtual save");
            return Ok(SaveOutcome::Virtual(report));
        };

        for id in self.key_ids() {
            if let Err(e) = self.update_storage(id) {
                warn!(key = %self.keys[id.0].path(), error = %e, "update storage");
            }
        }

        let data = self.storage.to_data()?;
        let outcome = self.ctx.policy.dispatch(&path, &data)?;
        if matches!(outcome, SaveOutcome::Written(_))
            && let Some(hook) = self.post_save.as_mut()
        {
            hook();
        }
        Ok(outcome)
    }

    /// Run `hook` after each save that wrote the file.
    pub fn set_post_save(&mut self, hook: impl FnMut() + 'static) {
        self.post_save = Some(Box::new(hook));
    }

    /// After each written save, ask the host to reload `name` from the saved
    /// file. Replaces any post-save hook.
    pub fn reload_on_save(&mut self, name: &str) {
        let Some(path) = self.storage.file_path().map(Path::to_path_buf) else {
            debug!(name, "no file to reload from");
            return;
        };
        let source = Rc::clone(self.source());
        let name = name.to_string();
        self.set_post_save(move || match KeyFile::load(&path) {
            Ok(doc) => source.manager_reload(&name, true, &doc),
            Err(e) => warn!(name = %name, error = %e, "reload after save"),
        });
    }

    /// Drop view bindings and the post-save hook.
    pub fn free(&mut self) {
        for key in &mut self.keys {
            key.binding = None;
            key.make_view = None;
        }
        self.post_save = None;
    }

    /// Release the keys and close the storage.
    pub(crate) fn close(&mut self) {
        self.free();
        self.storage.close();
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("file", &self.storage.file_path())
            .field("groups", &self.groups())
            .field("keys", &self.keys.len())
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
