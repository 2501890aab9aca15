//! ECS settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning for a `ComponentManager`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsSettings {
    /// Capacity given to pools created implicitly (first attach of an
    /// unregistered type).
    pub default_reserve: usize,
    /// Per-component reserve overrides keyed by component name.
    pub reserve: HashMap<String, usize>,
    /// Emit a per-pool summary from `ComponentManager::log_diagnostics`.
    pub log_diagnostics: bool,
}

impl Default for EcsSettings {
    fn default() -> Self {
        Self {
            default_reserve: 64,
            reserve: HashMap::new(),
            log_diagnostics: true,
        }
    }
}

impl EcsSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Reserve for a pool of `name`: the override if it is larger than
    /// `requested`, otherwise `requested`.
    pub fn reserve_for(&self, name: &str, requested: usize) -> usize {
        self.reserve
            .get(name)
            .copied()
            .map_or(requested, |r| r.max(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            EcsSettings::from_json_str(r#"{ "reserve": { "Transform": 4096 } }"#).unwrap();
        assert_eq!(settings.default_reserve, 64);
        assert!(settings.log_diagnostics);
        assert_eq!(settings.reserve_for("Transform", 16), 4096);
        assert_eq!(settings.reserve_for("Transform", 8192), 8192);
        assert_eq!(settings.reserve_for("Camera", 4), 4);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = EcsSettings::from_json_str("{ default_reserve: }").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_reserve": 8, "log_diagnostics": false }}"#).unwrap();
        let settings = EcsSettings::from_json_file(file.path()).unwrap();
        assert_eq!(settings.default_reserve, 8);
        assert!(!settings.log_diagnostics);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EcsSettings::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
