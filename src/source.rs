//! The host capability surface consumed by the builder.
//!
//! A host (the dock, an applet loader, a test) implements [`Source`]. Only
//! the identity methods and [`Source::create_main_dock`] are required; the
//! rest default to empty enumerations, identity encryption and
//! [`DockconfError::Unsupported`] for theme operations.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{DockconfError, Result};
use crate::keyfile::KeyFile;
use crate::types::DisplayMode;

/// Name of the main dock.
pub const MAIN_DOCK: &str = "_MainDock_";

/// Choice asking for a new dock to be created on save.
pub const NEW_DOCK: &str = "_NewDock_";

/// The "use default" choice of decorator and theme lists.
pub const DEFAULT_CHOICE: &str = "default";

/// Name of the custom icon theme.
pub const CUSTOM_ICONS: &str = "_Custom Icons_";

/// Group holding launcher definitions.
pub const DESKTOP_ENTRY: &str = "Desktop Entry";

/// One choice of an enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    pub key: String,
    pub name: String,
    pub icon: String,
}

impl Field {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            icon: String::new(),
        }
    }
}

/// Description of an applet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Handbook {
    pub name: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub icon: String,
    pub preview: String,
    pub version: String,
}

/// What the host knows about a window class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesktopClass {
    pub name: String,
    pub command: String,
    pub icon: String,
    pub menu_items: Vec<Vec<String>>,
}

pub trait Source {
    fn main_config_file(&self) -> PathBuf;

    fn main_config_default(&self) -> PathBuf;

    /// A path inside the shared data directory.
    fn dir_share_data(&self, parts: &[&str]) -> PathBuf;

    /// A path inside the user data directory.
    fn dir_user_app_data(&self, parts: &[&str]) -> PathBuf;

    fn app_icon(&self) -> String;

    /// Create a new dock and return its name.
    fn create_main_dock(&self) -> String;

    fn encrypt_string(&self, text: &str) -> String {
        text.to_string()
    }

    fn decrypt_string(&self, text: &str) -> String {
        text.to_string()
    }

    fn display_mode(&self) -> DisplayMode {
        DisplayMode::All
    }

    /// Docks that can hold an icon. `parent` is the icon's current dock.
    fn list_docks(&self, _parent: &str, _subdock: bool) -> Vec<Field> {
        Vec::new()
    }

    fn list_views(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_animations(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_dialog_decorators(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_desklet_decorators(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_screens(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_icons_main_dock(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_theme_desktop_icon(&self) -> Vec<Field> {
        Vec::new()
    }

    fn list_dock_themes(&self) -> Vec<Field> {
        Vec::new()
    }

    /// Handbooks of every known applet, by applet name.
    fn handbooks(&self) -> IndexMap<String, Handbook> {
        IndexMap::new()
    }

    fn handbook(&self, name: &str) -> Option<Handbook> {
        self.handbooks().shift_remove(name)
    }

    fn list_theme_xml(&self, _system_dir: &str, _user_dir: &str, _distant: &str) -> Vec<Field> {
        Vec::new()
    }

    fn list_theme_ini(&self, _system_dir: &str, _user_dir: &str, _distant: &str) -> Vec<Field> {
        Vec::new()
    }

    fn desktop_class(&self, _class: &str) -> Option<DesktopClass> {
        None
    }

    fn current_theme_load(&self, _theme: &str, _behaviour: bool, _launchers: bool) -> Result<()> {
        Err(DockconfError::Unsupported("theme load"))
    }

    fn current_theme_save(&self, _name: &str, _behaviour: bool, _launchers: bool) -> Result<()> {
        Err(DockconfError::Unsupported("theme save"))
    }

    /// Ask the host to reload the subsystem `name` from its saved config.
    fn manager_reload(&self, _name: &str, _reload: bool, _doc: &KeyFile) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::TestSource;

    #[test]
    fn defaults_are_inert() {
        let source = TestSource::default();
        assert_eq!(source.display_mode(), DisplayMode::All);
        assert!(source.list_views().is_empty());
        assert!(source.desktop_class("firefox").is_none());
        assert!(matches!(
            source.current_theme_save("mine", true, true),
            Err(DockconfError::Unsupported(_))
        ));
        source.manager_reload("Dock", true, &KeyFile::new());
        assert_eq!(source.reloads.borrow().len(), 1);
    }

    #[test]
    fn handbook_lookup_uses_index() {
        let source = TestSource::default();
        let hb = source.handbook("clock").unwrap();
        assert_eq!(hb.title, "Clock");
        assert!(source.handbook("missing").is_none());
    }

    #[test]
    fn identity_crypto_by_default() {
        struct Plain;
        impl Source for Plain {
            fn main_config_file(&self) -> PathBuf {
                PathBuf::new()
            }
            fn main_config_default(&self) -> PathBuf {
                PathBuf::new()
            }
            fn dir_share_data(&self, _: &[&str]) -> PathBuf {
                PathBuf::new()
            }
            fn dir_user_app_data(&self, _: &[&str]) -> PathBuf {
                PathBuf::new()
            }
            fn app_icon(&self) -> String {
                String::new()
            }
            fn create_main_dock(&self) -> String {
                String::new()
            }
        }
        assert_eq!(Plain.encrypt_string("x"), "x");
        assert_eq!(Plain.decrypt_string("x"), "x");
    }
}
