//! Typed, group-organised configuration pages for dock and applet config
//! files.
//!
//! A dock config is a keyfile: `[Group]` headers, `key=value` lines, and a
//! comment above each key describing how to edit it:
//!
//! ```text
//! [Position]
//! #e[0;1] Alignment {Relative position on the screen}
//! alignment=0.5
//! ```
//!
//! The comment's first character is the key type (`e`: float scale), then
//! optional modifiers, a cardinality, the authorised values in brackets, the
//! label and a `{tooltip}`. dockconf parses those comments into typed
//! [`Key`]s, lays them out as toolkit-agnostic [`Page`]s, and routes value
//! reads and writes between the file and whatever the host displays.
//!
//! ```ignore
//! let ctx = BuildContext::new(Rc::new(my_source))
//!     .save_policy(SavePolicy::load(&own_config, ENV_PREFIX)?)
//!     .factories(my_widget_factories);
//! let mut grouper = Grouper::from_file(conf, Some(default_conf), ctx)?;
//! grouper.build_all(&mut my_switcher, vec![]);
//! // ... user edits ...
//! match grouper.save()? {
//!     SaveOutcome::Virtual(report) => println!("{report}"),
//!     outcome => info!(?outcome, "saved"),
//! }
//! ```
//!
//! # Value routing
//!
//! Until its page is built, a key reads and writes the storage directly.
//! [`Builder::build_page`] asks the [`ViewFactories`] for a [`ViewBinding`]
//! per key; from then on the key reads and writes the view, and only
//! [`Builder::update_storage`] (or a save) copies view values back.
//!
//! # Host surface
//!
//! The host implements [`Source`] (paths, enumerations for list keys,
//! password encryption, dock creation) and registers view factories. Without
//! factories, [`ViewFactories::headless`] binds every key to an in-memory
//! [`ViewCell`], which is enough for scripted edits and tests.
//!
//! # Saving
//!
//! What a save does is decided by [`SavePolicy`], read from the `GUI
//! Settings` group of the own config (`gui.conf`) and `DOCKCONF__*`
//! environment variables:
//!
//! | Settings | Outcome |
//! |---|---|
//! | `save enabled=true`, or the file is `gui.conf` | file written |
//! | `save editor=meld` | changes written to a temp file, editor started |
//! | neither | nothing written, a [`Report`] of the changes is returned |
//!
//! Files are written with owner-only permissions on unix.

pub mod builder;
pub mod comment;
pub mod dock;
pub mod error;
pub mod grouper;
pub mod key;
pub mod keyfile;
pub mod newkey;
pub mod persist;
pub mod report;
pub mod settings;
pub mod source;
pub mod storage;
pub mod tweak;
pub mod types;
pub mod value;
pub mod view;
pub mod virtual_storage;

#[cfg(test)]
mod fixtures;

pub use builder::{BuildContext, Builder, Translator};
pub use comment::{KeyBase, parse_key_comment};
pub use error::{DockconfError, Result};
pub use grouper::{Grouper, Switcher};
pub use key::{Key, KeyId, KeyMut, KeyRef, ValueState, ValueStateField, ValueStateList};
pub use keyfile::KeyFile;
pub use persist::{ENV_PREFIX, OWN_CONFIG_NAME, SaveOutcome, SavePolicy};
pub use report::{Report, default_report, updated_report};
pub use settings::SaveSettings;
pub use source::{DesktopClass, Field, Handbook, Source};
pub use storage::{FileStorage, Storage};
pub use tweak::Tweak;
pub use types::{DisplayMode, KeyType};
pub use value::{FromValue, Value, ValueKind, Valuer};
pub use view::{MakeView, Page, PageItem, ViewBinding, ViewCell, ViewFactories};
pub use virtual_storage::VirtualStorage;
