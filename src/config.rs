//! Ambient settings shared by every loader.
//!
//! [`Settings`] is an immutable value. Per-variant overrides go through
//! [`Settings::with_overrides`], which returns a new value and leaves the
//! ambient one untouched.

use crate::error::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// File read from the working directory when no `--config` is given.
pub const DEFAULT_SETTINGS_FILE: &str = "muxsuite.toml";

/// Setting holding the `--mux-suite-only` filter.
pub const MUX_SUITE_ONLY: &str = "mux_suite_only";
/// Setting holding the `--mux-suite-out` filter.
pub const MUX_SUITE_OUT: &str = "mux_suite_out";

/// Ordered key/value settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML text. Top-level keys become setting names.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            values.insert(key, serde_json::to_value(value)?);
        }
        Ok(Self { values })
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Read `muxsuite.toml` from `root` if it exists, otherwise return empty settings.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(DEFAULT_SETTINGS_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Return these settings with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Derive a new value with `overrides` laid over a copy of these settings.
    pub fn with_overrides<'a, I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut values = self.values.clone();
        for (key, value) in overrides {
            values.insert(key.clone(), value.clone());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String setting; `Ok(None)` when unset.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ConfigError::InvalidType {
                key: key.to_string(),
                wanted: "a string",
            }),
        }
    }

    /// List-of-strings setting. A single string counts as a one-element list.
    pub fn get_string_list(&self, key: &str) -> Result<Option<Vec<String>>, ConfigError> {
        let invalid = || ConfigError::InvalidType {
            key: key.to_string(),
            wanted: "a list of strings",
        };

        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(invalid()),
        }
    }
}
