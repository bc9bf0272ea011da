use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueKind;

#[derive(Debug, Error)]
pub enum DockconfError {
    #[error("Failed to load {path} (line {line}): {reason}")]
    LoadFailed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Key not found: {group}/{name}")]
    KeyMissing { group: String, name: String },

    #[error("Type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: ValueKind },

    #[error("Bad target for '{key}': the view holds a different type than {expected}")]
    BadTarget { key: String, expected: ValueKind },

    #[error("Default value unavailable: {reason}")]
    DefaultUnavailable { reason: String },

    #[error("Failed to save {path}: {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Failed to launch editor '{editor}': {source}")]
    EditorLaunch {
        editor: String,
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Operation not supported by this source: {0}")]
    Unsupported(&'static str),
}

pub type Result<T, E = DockconfError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_failed_formats_correctly() {
        let err = DockconfError::LoadFailed {
            path: "/home/user/.config/cairo-dock/current_theme/cairo-dock.conf".into(),
            line: 12,
            reason: "line outside of a group".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cairo-dock.conf"));
        assert!(msg.contains("12"));
        assert!(msg.contains("outside of a group"));
    }

    #[test]
    fn key_missing_names_group_and_key() {
        let err = DockconfError::KeyMissing {
            group: "Icons".into(),
            name: "size".into(),
        };
        assert_eq!(err.to_string(), "Key not found: Icons/size");
    }

    #[test]
    fn type_mismatch_names_expected_kind() {
        let err = DockconfError::TypeMismatch {
            key: "Icons/size".into(),
            expected: ValueKind::ListInt,
        };
        let msg = err.to_string();
        assert!(msg.contains("Icons/size"));
        assert!(msg.contains("int list"));
    }

    #[test]
    fn unsupported_formats() {
        let err = DockconfError::Unsupported("theme save");
        assert!(err.to_string().contains("theme save"));
    }
}
