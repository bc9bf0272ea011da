//! Deferred edits applied to a builder after its groups are loaded.
//!
//! A host can't know the final key set before the file is parsed, so it
//! passes a list of tweaks to [`Grouper::build_all`](crate::Grouper::build_all)
//! which runs them between loading and page building.

use crate::builder::Builder;
use crate::key::{Key, KeyMut};
use crate::view::MakeView;

pub type Tweak = Box<dyn FnOnce(&mut Builder)>;

pub fn add_group(group: &str, keys: Vec<Key>) -> Tweak {
    let group = group.to_string();
    Box::new(move |b: &mut Builder| b.add_group(&group, keys))
}

pub fn add_keys(group: &str, keys: Vec<Key>) -> Tweak {
    let group = group.to_string();
    Box::new(move |b: &mut Builder| b.add_keys(&group, keys))
}

pub fn key_action(group: &str, name: &str, f: impl FnOnce(&mut KeyMut<'_>) + 'static) -> Tweak {
    let (group, name) = (group.to_string(), name.to_string());
    Box::new(move |b: &mut Builder| {
        b.key_action(&group, &name, f);
    })
}

/// Replace the view factory of one key.
pub fn key_make_view(group: &str, name: &str, make_view: MakeView) -> Tweak {
    key_action(group, name, move |key| key.make_view = Some(make_view))
}

pub fn key_set_aligned_vertical(group: &str, name: &str) -> Tweak {
    key_action(group, name, |key| key.aligned_vertical = true)
}

pub fn key_set_label_selectable(group: &str, name: &str) -> Tweak {
    key_action(group, name, |key| key.label_selectable = true)
}
