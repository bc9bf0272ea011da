//! Save settings read from the own config file.
//!
//! The `GUI Settings` group of the own config (`gui.conf`) tells the builder
//! what to do on save. The group is shared with other GUI options, so keys
//! this struct does not know are logged and skipped. Resolution steps:
//!
//! 1. Read `GUI Settings` entries and normalise their names
//!    (`save enabled`, `SaveEnabled` → `save_enabled`).
//! 2. Parse values heuristically: bool → integer → float → string.
//! 3. Overlay `{PREFIX}__SAVE_ENABLED` style environment variables.
//! 4. Deserialize into the confique layer, then let confique fill defaults.

use std::path::PathBuf;

use confique::Config;
use serde::Serialize;
use toml::{Table, Value};
use tracing::debug;

use crate::error::{DockconfError, Result};
use crate::keyfile::KeyFile;

/// Group of the own config holding the save settings.
pub const GUI_GROUP: &str = "GUI Settings";

/// What a save does with the rendered config.
#[derive(Config, Serialize, Debug, Clone, PartialEq, Default)]
pub struct SaveSettings {
    /// Write changes to the config files.
    #[config(default = false)]
    pub save_enabled: bool,

    /// Editor receiving the config file and a temp file with the changes,
    /// used when saving is disabled.
    #[config(default = "")]
    pub save_editor: String,

    /// Where changes are written for the editor. Defaults to the system temp dir.
    pub temp_file: Option<PathBuf>,
}

impl SaveSettings {
    /// Resolve from the own config document and environment pairs.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
    pub fn resolve(
        own: Option<&KeyFile>,
        env_prefix: Option<&str>,
        env_vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut merged = own.map(group_to_table).unwrap_or_default();
        if let Some(prefix) = env_prefix {
            merged.extend(env_to_table(prefix, env_vars));
        }

        let mut unknown = Vec::new();
        let layer: <SaveSettings as Config>::Layer =
            serde_ignored::deserialize(Value::Table(merged), |path| {
                unknown.push(path.to_string())
            })
            .map_err(|e: toml::de::Error| DockconfError::InvalidValue {
                key: GUI_GROUP.into(),
                reason: e.to_string(),
            })?;
        for key in &unknown {
            debug!(key = %key, "other gui setting ignored");
        }

        SaveSettings::builder()
            .preloaded(layer)
            .load()
            .map_err(DockconfError::from)
    }
}

fn group_to_table(doc: &KeyFile) -> Table {
    doc.keys(GUI_GROUP)
        .into_iter()
        .filter_map(|key| {
            let raw = doc.raw(GUI_GROUP, key)?;
            Some((normalise_key(key), parse_scalar(raw)))
        })
        .collect()
}

/// Flat `{PREFIX}__KEY` variables, lowercased. Nested names are ignored.
fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    vars.into_iter()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(&needle)?;
            if rest.is_empty() || rest.contains("__") {
                return None;
            }
            Some((rest.to_lowercase(), parse_scalar(&value)))
        })
        .collect()
}

/// `save enabled`, `save-enabled` and `SaveEnabled` all map to `save_enabled`.
fn normalise_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for c in key.trim().chars() {
        match c {
            ' ' | '-' | '_' => {
                if !out.ends_with('_') {
                    out.push('_');
                }
                prev_lower = false;
            }
            c if c.is_uppercase() => {
                if prev_lower {
                    out.push('_');
                }
                out.extend(c.to_lowercase());
                prev_lower = false;
            }
            c => {
                out.push(c);
                prev_lower = c.is_lowercase() || c.is_ascii_digit();
            }
        }
    }
    out
}

/// Tries: bool → integer → float → string.
fn parse_scalar(s: &str) -> Value {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // Only dotted numbers, so "nan" and "inf" stay strings.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}
