//! Save policy: decide what a save does with the rendered config.
//!
//! - The own config (`gui.conf`) is always written.
//! - With `save enabled`, every config is written.
//! - With a `save editor`, the changes go to a temp file and the editor is
//!   started on `(config, temp)` without waiting for it.
//! - Otherwise the save is virtual: nothing is written and the builder
//!   returns a change report instead.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{error, info, warn};

use crate::error::{DockconfError, Result};
use crate::keyfile::KeyFile;
use crate::report::Report;
use crate::settings::SaveSettings;

/// Base name of the own config file.
pub const OWN_CONFIG_NAME: &str = "gui.conf";

/// Default env var prefix for save settings.
pub const ENV_PREFIX: &str = "DOCKCONF";

const TEMP_FILE_NAME: &str = "dockconf-diff.conf";

/// Result of [`Builder::save`](crate::Builder::save).
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Nothing written; the report lists what would have changed.
    Virtual(Report),
    /// The config file was written.
    Written(PathBuf),
    /// Changes were written to `temp` and `editor` was started.
    EditorLaunched { editor: String, temp: PathBuf },
}

/// The injected save policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePolicy {
    pub settings: SaveSettings,
    pub own_config: Option<PathBuf>,
}

impl SavePolicy {
    pub fn new(settings: SaveSettings) -> Self {
        Self {
            settings,
            own_config: None,
        }
    }

    /// A policy writing every save to disk.
    pub fn write_through() -> Self {
        Self::new(SaveSettings {
            save_enabled: true,
            ..SaveSettings::default()
        })
    }

    /// Resolve settings from the own config file and `{env_prefix}__*` env vars.
    /// A missing own config leaves the defaults (virtual saves).
    pub fn load(own_config: &Path, env_prefix: &str) -> Result<Self> {
        let doc = if own_config.exists() {
            Some(KeyFile::load(own_config)?)
        } else {
            None
        };
        let settings = SaveSettings::resolve(doc.as_ref(), Some(env_prefix), std::env::vars())?;
        info!(
            path = %own_config.display(),
            save_enabled = settings.save_enabled,
            editor = %settings.save_editor,
            "save settings loaded"
        );
        Ok(Self {
            settings,
            own_config: Some(own_config.to_path_buf()),
        })
    }

    /// `gui.conf` in the platform config directory of `app_name`.
    pub fn platform_own_config(app_name: &str) -> Option<PathBuf> {
        let proj = directories::ProjectDirs::from("", "", app_name)?;
        Some(proj.config_dir().join(OWN_CONFIG_NAME))
    }

    /// [`load`](Self::load) from the platform own config of `app_name`.
    /// Without a home directory the defaults apply.
    pub fn load_platform(app_name: &str, env_prefix: &str) -> Result<Self> {
        match Self::platform_own_config(app_name) {
            Some(path) => Self::load(&path, env_prefix),
            None => {
                warn!(app_name, "no platform config directory");
                Ok(Self::default())
            }
        }
    }

    pub fn own_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.own_config = Some(path.into());
        self
    }

    pub fn is_own_config(&self, file: &Path) -> bool {
        self.own_config.as_deref() == Some(file)
            || file.file_name().is_some_and(|n| n == OWN_CONFIG_NAME)
    }

    /// Whether saving `file` only reports changes.
    pub fn is_virtual(&self, file: &Path) -> bool {
        !self.settings.save_enabled && self.settings.save_editor.is_empty() && !self.is_own_config(file)
    }

    pub fn temp_file(&self) -> PathBuf {
        self.settings
            .temp_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(TEMP_FILE_NAME))
    }

    /// Write `data` for `file` according to the settings. Fails with
    /// [`DockconfError::SaveFailed`] when the save [`is_virtual`](Self::is_virtual).
    pub fn dispatch(&self, file: &Path, data: &str) -> Result<SaveOutcome> {
        if self.settings.save_enabled || self.is_own_config(file) {
            write_private(file, data)?;
            info!(path = %file.display(), "config saved");
            return Ok(SaveOutcome::Written(file.to_path_buf()));
        }

        let editor = &self.settings.save_editor;
        if editor.is_empty() {
            return Err(DockconfError::SaveFailed {
                path: file.to_path_buf(),
                reason: "saving is disabled".into(),
            });
        }

        let temp = self.temp_file();
        write_private(&temp, data)?;
        spawn_detached(editor, file, &temp).map_err(|e| {
            error!(editor = %editor, error = %e, "editor launch failed");
            DockconfError::EditorLaunch {
                editor: editor.clone(),
                source: e,
            }
        })?;
        info!(editor = %editor, file = %file.display(), temp = %temp.display(), "changes sent to editor");
        Ok(SaveOutcome::EditorLaunched {
            editor: editor.clone(),
            temp,
        })
    }
}

/// Write a file readable by its owner only, creating parent directories.
fn write_private(path: &Path, data: &str) -> Result<()> {
    let save_failed = |e: std::io::Error| DockconfError::SaveFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(save_failed)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut f = options.open(path).map_err(save_failed)?;
    f.write_all(data.as_bytes()).map_err(save_failed)
}

/// Start `editor file temp` in its own process group, without waiting.
fn spawn_detached(editor: &str, file: &Path, temp: &Path) -> std::io::Result<()> {
    let mut cmd = Command::new(editor);
    cmd.arg(file).arg(temp);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    cmd.spawn().map(drop)
}
