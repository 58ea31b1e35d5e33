//! Store configuration: key prefix, version gate, reserved compression flag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StorageError};

/// Version written and expected when the caller does not choose one.
pub const DEFAULT_VERSION: &str = "1.0";

/// Separator between prefix and key in the storage key.
pub const PREFIX_SEPARATOR: char = ':';

/// Options for a `VersionedStore`.
///
/// Accepts the JS option shape `{ prefix, version, enableCompression }`;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub prefix: String,
    /// `None` disables the version gate.
    pub version: Option<String>,
    /// Reserved. Stored values are never compressed.
    pub enable_compression: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            version: Some(DEFAULT_VERSION.to_string()),
            enable_compression: false,
        }
    }
}

impl StoreConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    /// Derive the storage key for `key` under this config's prefix.
    pub fn storage_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{PREFIX_SEPARATOR}{key}", self.prefix)
        }
    }

    /// Parse a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| StorageError::InvalidConfig(format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate and convert an already parsed JSON value.
    ///
    /// Only a JSON object is accepted; `null`, arrays and scalars are rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(StorageError::InvalidConfig("expected a JSON object".to_string()));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))
    }
}
