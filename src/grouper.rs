//! Build flows over a [`Builder`]: one page, every group, or a chosen set.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::builder::{BuildContext, Builder};
use crate::error::Result;
use crate::newkey;
use crate::storage::FileStorage;
use crate::tweak::{self, Tweak};
use crate::view::Page;
use crate::virtual_storage::VirtualStorage;

/// Group shown when a config file can't be loaded.
pub const PROBLEM_GROUP: &str = "problem";

/// Host page switcher for multi-group configs.
pub trait Switcher {
    /// Register a page under its translated title.
    fn add_page(&mut self, page: &Page, title: &str);

    fn activate(&mut self, group: &str);

    fn set_visible(&mut self, visible: bool);

    /// Called when `group` becomes the displayed page.
    fn show_page(&mut self, _group: &str) {}

    /// Called when `group` stops being the displayed page.
    fn hide_page(&mut self, _group: &str) {}
}

/// Owns a builder and the pages built from it.
///
/// Dropping the grouper frees view bindings, then closes the storage.
#[derive(Debug)]
pub struct Grouper {
    builder: Builder,
    pages: IndexMap<String, Page>,
    active: Option<String>,
}

impl Grouper {
    pub fn new(builder: Builder) -> Self {
        Self {
            builder,
            pages: IndexMap::new(),
            active: None,
        }
    }

    /// Load `file`, with `default` as its default shadow.
    pub fn from_file(
        file: impl Into<PathBuf>,
        default: Option<PathBuf>,
        ctx: BuildContext,
    ) -> Result<Self> {
        let storage = FileStorage::load(file, default)?;
        Ok(Self::new(Builder::new(storage, ctx)))
    }

    /// Like [`from_file`](Self::from_file), but a load failure yields a
    /// single `problem` page describing it, and `false`.
    pub fn from_file_safe(
        file: impl AsRef<Path>,
        default: Option<PathBuf>,
        ctx: BuildContext,
    ) -> (Self, bool) {
        let file = file.as_ref();
        let err = match Self::from_file(file, default, ctx.clone()) {
            Ok(grouper) => return (grouper, true),
            Err(e) => e,
        };
        error!(path = %file.display(), error = %err, "load config file");

        let mut grouper = Self::new_virtual(ctx);
        grouper.add_group(
            PROBLEM_GROUP,
            vec![
                newkey::frame(PROBLEM_GROUP, "fail", "Load failed", "dialog-error"),
                newkey::text_label(
                    PROBLEM_GROUP,
                    "text",
                    "Can't load the configuration file to build the interface.",
                ),
                newkey::text_label(PROBLEM_GROUP, "file", &file.display().to_string()),
            ],
        );
        grouper.build_single(
            PROBLEM_GROUP,
            vec![tweak::key_set_label_selectable(PROBLEM_GROUP, "file")],
        );
        (grouper, false)
    }

    /// A grouper over an empty in-memory storage. Its saves are always virtual.
    pub fn new_virtual(ctx: BuildContext) -> Self {
        Self::new(Builder::new(VirtualStorage::new(), ctx))
    }

    /// Load one group, apply the tweaks and build its page.
    pub fn build_single(&mut self, group: &str, tweaks: Vec<Tweak>) -> &Page {
        self.builder.add_group_from_storage(group);
        self.build_apply(tweaks);
        self.build_page_stored(group)
    }

    /// Build every group of the storage under `switcher`.
    pub fn build_all(&mut self, switcher: &mut dyn Switcher, tweaks: Vec<Tweak>) {
        let groups = self.builder.storage().groups();
        self.build_groups(switcher, &groups, tweaks);
    }

    /// Build the given groups under `switcher`. The first page is activated
    /// and the switcher is shown only for more than one group.
    pub fn build_groups(&mut self, switcher: &mut dyn Switcher, groups: &[String], tweaks: Vec<Tweak>) {
        for group in groups {
            self.builder.add_group_from_storage(group);
        }
        self.build_apply(tweaks);

        let built: Vec<String> = self.builder.groups().into_iter().map(str::to_string).collect();
        for (i, group) in built.iter().enumerate() {
            let title = self.builder.translate(group);
            let page = self.build_page_stored(group);
            switcher.add_page(page, &title);
            if i == 0 {
                self.switch_page(switcher, group);
            }
        }
        switcher.set_visible(groups.len() > 1);
        debug!(groups = built.len(), "pages built");
    }

    /// Display the page of `group`, hiding the current one. Returns `false`
    /// when no page was built for `group`.
    pub fn switch_page(&mut self, switcher: &mut dyn Switcher, group: &str) -> bool {
        if !self.pages.contains_key(group) {
            debug!(group, "no page to switch to");
            return false;
        }
        if self.active.as_deref() == Some(group) {
            return true;
        }
        if let Some(previous) = self.active.take() {
            switcher.hide_page(&previous);
        }
        switcher.activate(group);
        switcher.show_page(group);
        self.active = Some(group.to_string());
        true
    }

    /// Group of the displayed page.
    pub fn active_page(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Run tweaks in order.
    pub fn build_apply(&mut self, tweaks: Vec<Tweak>) {
        for tweak in tweaks {
            tweak(&mut self.builder);
        }
    }

    fn build_page_stored(&mut self, group: &str) -> &Page {
        let page = self.builder.build_page(group);
        self.pages.insert(group.to_string(), page);
        &self.pages[group]
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn page(&self, group: &str) -> Option<&Page> {
        self.pages.get(group)
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
}

impl Deref for Grouper {
    type Target = Builder;

    fn deref(&self) -> &Builder {
        &self.builder
    }
}

impl DerefMut for Grouper {
    fn deref_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
}

impl Drop for Grouper {
    fn drop(&mut self) {
        self.builder.close();
    }
}
