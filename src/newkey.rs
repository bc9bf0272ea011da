//! Constructors for keys declared in code rather than parsed from a file.

use crate::key::Key;
use crate::types::KeyType;
use crate::view::MakeView;

fn labelled(group: &str, name: &str, key_type: KeyType, label: &str) -> Key {
    let mut key = Key::new(group, name, key_type);
    key.text = label.to_string();
    key
}

pub fn bool(group: &str, name: &str, label: &str) -> Key {
    labelled(group, name, KeyType::BoolButton, label)
}

pub fn string_entry(group: &str, name: &str, label: &str) -> Key {
    labelled(group, name, KeyType::StringEntry, label)
}

pub fn text_label(group: &str, name: &str, label: &str) -> Key {
    labelled(group, name, KeyType::TextLabel, label)
}

/// A frame titled `label`, with an optional icon.
pub fn frame(group: &str, name: &str, label: &str, icon: &str) -> Key {
    let mut key = labelled(group, name, KeyType::Frame, label);
    key.authorised_values = vec![label.to_string(), icon.to_string()];
    key
}

pub fn separator(group: &str, name: &str) -> Key {
    Key::new(group, name, KeyType::Separator)
}

/// A link button: `label` pointing at `uri`.
pub fn link(group: &str, name: &str, label: &str, uri: &str) -> Key {
    let mut key = labelled(group, name, KeyType::Link, label);
    key.authorised_values = vec![uri.to_string()];
    key
}

/// A button running `command`.
pub fn launch_command(group: &str, name: &str, label: &str, command: &str) -> Key {
    let mut key = labelled(group, name, KeyType::LaunchCmdSimple, label);
    key.authorised_values = vec![command.to_string()];
    key
}

/// A combo storing the index of the selected choice.
pub fn list_numbered(group: &str, name: &str, label: &str, choices: &[&str]) -> Key {
    let mut key = labelled(group, name, KeyType::ListNumbered, label);
    key.authorised_values = choices.iter().map(|c| c.to_string()).collect();
    key
}

/// A widget filling the page, usually paired with [`custom`].
pub fn empty_full(group: &str, name: &str) -> Key {
    Key::new(group, name, KeyType::EmptyFull)
}

/// A key whose view comes from `make_view` instead of the factory table.
pub fn custom(group: &str, name: &str, key_type: KeyType, make_view: MakeView) -> Key {
    let mut key = Key::new(group, name, key_type);
    key.make_view = Some(make_view);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::view::ViewCell;
    use std::rc::Rc;

    #[test]
    fn frames_carry_title_and_icon() {
        let key = frame("G", "f", "Look", "icon.png");
        assert_eq!(key.key_type, KeyType::Frame);
        assert_eq!(key.authorised_values, vec!["Look", "icon.png"]);
    }

    #[test]
    fn list_numbered_choices() {
        let key = list_numbered("G", "l", "Style", &["a", "b"]);
        assert_eq!(key.authorised_values.len(), 2);
        assert_eq!(key.nb_elements, 1);
    }

    #[test]
    fn custom_keys_hold_their_factory() {
        let cell = ViewCell::new(Value::Int(1));
        let key = custom(
            "G",
            "c",
            KeyType::EmptyFull,
            Rc::new(move |_: &crate::key::KeyRef<'_>| Some(cell.binding())),
        );
        assert!(key.make_view.is_some());
        assert!(!key.is_bound());
    }
}
