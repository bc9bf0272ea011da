#[cfg(test)]
pub mod test {
    use std::cell::{Cell, RefCell};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use indexmap::IndexMap;
    use tempfile::TempDir;

    use crate::builder::{BuildContext, Builder};
    use crate::keyfile::KeyFile;
    use crate::persist::SavePolicy;
    use crate::source::{Handbook, Source};
    use crate::storage::FileStorage;
    use crate::types::DisplayMode;

    /// A dock config: a frame, a display-gated key, an unknown glyph, an
    /// uncommented key and an "encrypted" password.
    pub const DOCK_CONF: &str = "#!en;1.0

[Display]

#F[Behaviour;gtk-preferences] Behaviour
frame=

#b Enabled: {Show the dock}
enabled=false

#j[16;256] Icon size:
size=48;48;

#l[Flat;3D;Curved] Style:
style=1

#b* Cairo effect:
effect=true

[Colours]

#C Outline colour:
outline=0.1;0.2;0.3;1;

#e[0;1] Alpha:
alpha=0.5

[Icons]

#U Order:
order=x;y;z;

untyped=1

#9 Weird:
weird=2

#d Dock:
dock=_MainDock_

#p Password:
secret=2retnuh
";

    /// Defaults for [`DOCK_CONF`]: `enabled`, `alpha` and `secret` differ.
    pub const DEFAULT_CONF: &str = "#!en;1.0

[Display]

#F[Behaviour;gtk-preferences] Behaviour
frame=

#b Enabled: {Show the dock}
enabled=true

#j[16;256] Icon size:
size=48;48;

#l[Flat;3D;Curved] Style:
style=1

#b* Cairo effect:
effect=true

[Colours]

#C Outline colour:
outline=0.1;0.2;0.3;1;

#e[0;1] Alpha:
alpha=1

[Icons]

#U Order:
order=x;y;z;

#d Dock:
dock=_MainDock_

#p Password:
secret=
";

    pub fn write_conf(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// A builder over `dock.conf` and `default.conf` written in `dir`.
    pub fn file_builder(dir: &TempDir, policy: SavePolicy) -> Builder {
        let path = write_conf(dir, "dock.conf", DOCK_CONF);
        let default = write_conf(dir, "default.conf", DEFAULT_CONF);
        Builder::new(
            FileStorage::load(path, Some(default)).unwrap(),
            BuildContext::new(Rc::new(TestSource::default())).save_policy(policy),
        )
    }

    /// A host that reverses "encrypted" strings, counts created docks and
    /// records reload requests.
    #[derive(Debug, Default)]
    pub struct TestSource {
        pub mode: DisplayMode,
        pub docks_created: Cell<usize>,
        pub reloads: RefCell<Vec<(String, bool, KeyFile)>>,
    }

    impl Source for TestSource {
        fn main_config_file(&self) -> PathBuf {
            PathBuf::from("/tmp/dockconf-test/dock.conf")
        }

        fn main_config_default(&self) -> PathBuf {
            PathBuf::from("/usr/share/dockconf/dock.conf")
        }

        fn dir_share_data(&self, parts: &[&str]) -> PathBuf {
            parts.iter().fold(PathBuf::from("/usr/share/dockconf"), |p, s| p.join(s))
        }

        fn dir_user_app_data(&self, parts: &[&str]) -> PathBuf {
            parts
                .iter()
                .fold(Path::new("/tmp/dockconf-test").to_path_buf(), |p, s| p.join(s))
        }

        fn app_icon(&self) -> String {
            "dockconf".into()
        }

        fn create_main_dock(&self) -> String {
            let n = self.docks_created.get() + 1;
            self.docks_created.set(n);
            format!("dock-{n}")
        }

        fn encrypt_string(&self, text: &str) -> String {
            text.chars().rev().collect()
        }

        fn decrypt_string(&self, text: &str) -> String {
            text.chars().rev().collect()
        }

        fn display_mode(&self) -> DisplayMode {
            self.mode
        }

        fn manager_reload(&self, name: &str, reload: bool, doc: &KeyFile) {
            self.reloads
                .borrow_mut()
                .push((name.to_string(), reload, doc.clone()));
        }

        fn handbooks(&self) -> IndexMap<String, Handbook> {
            let clock = Handbook {
                name: "clock".into(),
                title: "Clock".into(),
                author: "dockconf".into(),
                description: "Shows the time.".into(),
                ..Handbook::default()
            };
            IndexMap::from([("clock".to_string(), clock)])
        }
    }
}
