//! VersionedStore<T>: typed, versioned, namespaced access to one storage key.
//!
//! Values are wrapped in an [`Envelope`] and written as JSON. Reads pass
//! through the version gate: an envelope written under a different version
//! is purged and reported as absent. A malformed envelope is reported as
//! absent too, but left in place.
//!
//! The plain operations (`get`, `set`, `clear`, `exists`) never fail; every
//! failure becomes a log event and "no effect". The `try_*` variants return
//! the failure instead.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::host::HostStorage;
use crate::logger::{Level, LogEvent, StoreLogger, TracingLogger};

/// Handle to one typed value in host storage.
///
/// Build it once per binding and reuse it; it holds no cached state, so a
/// `set` is visible to the next `get` immediately.
pub struct VersionedStore<T> {
    key: String,
    config: StoreConfig,
    host: Arc<dyn HostStorage>,
    logger: Arc<dyn StoreLogger>,
    _value: PhantomData<fn() -> T>,
}

impl<T> VersionedStore<T> {
    /// Create a store logging through `tracing`.
    pub fn new(host: Arc<dyn HostStorage>, key: &str, config: StoreConfig) -> Self {
        Self::with_logger(host, key, config, TracingLogger::shared("storage"))
    }

    /// Create a store with an injected logger.
    pub fn with_logger(
        host: Arc<dyn HostStorage>,
        key: &str,
        config: StoreConfig,
        logger: Arc<dyn StoreLogger>,
    ) -> Self {
        let key = config.storage_key(key);
        logger.log(
            &LogEvent::new(Level::Info, "Storage initialized")
                .with("key", key.as_str())
                .with("version", config.version.clone()),
        );
        Self {
            key,
            config,
            host,
            logger,
            _value: PhantomData,
        }
    }

    /// The storage key, prefix included.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<dyn StoreLogger> {
        &self.logger
    }

    /// Remove the value. Removing an absent value is not an error.
    pub fn clear(&self) {
        match self.host.remove_item(&self.key) {
            Ok(()) => self.log(LogEvent::new(Level::Info, "Item cleared from storage")),
            Err(e) => self.log(
                LogEvent::new(Level::Error, "Failed to clear item from storage")
                    .with("error", e.to_string()),
            ),
        }
    }

    /// True when any raw value sits at the key, valid or not.
    pub fn exists(&self) -> bool {
        match self.host.get_item(&self.key) {
            Ok(raw) => raw.is_some(),
            Err(e) => {
                self.log(
                    LogEvent::new(Level::Error, "Failed to check item in storage")
                        .with("error", e.to_string()),
                );
                false
            }
        }
    }

    fn log(&self, event: LogEvent) {
        self.logger.log(&event.with("key", self.key.as_str()));
    }
}

impl<T: DeserializeOwned> VersionedStore<T> {
    /// Read the value, or `None` when absent, stale or unreadable.
    pub fn get(&self) -> Option<T> {
        match self.try_get() {
            Ok(value) => value,
            Err(e) => {
                self.log(
                    LogEvent::new(Level::Error, "Failed to get item from storage")
                        .with("error", e.to_string()),
                );
                None
            }
        }
    }

    /// Read the value, returning host and parse failures.
    ///
    /// A version mismatch is not a failure: the stale entry is removed and
    /// `Ok(None)` returned.
    pub fn try_get(&self) -> Result<Option<T>> {
        let Some(raw) = self.host.get_item(&self.key)? else {
            return Ok(None);
        };
        let envelope = Envelope::<Value>::from_json(&self.key, &raw)?;

        let expected = self.config.version.as_deref();
        if !envelope.matches_version(expected) {
            self.log(
                LogEvent::new(Level::Warn, "Version mismatch, clearing storage")
                    .with("expected", expected)
                    .with("found", envelope.version),
            );
            self.clear();
            return Ok(None);
        }
        Ok(Some(envelope.decode::<T>(&self.key)?.data))
    }
}

impl<T: Serialize> VersionedStore<T> {
    /// Write the value. Failures are logged and the prior value is kept.
    pub fn set(&self, value: &T) {
        if let Err(e) = self.try_set(value) {
            self.log(
                LogEvent::new(Level::Error, "Failed to save item to storage")
                    .with("error", e.to_string()),
            );
        }
    }

    /// Write the value and return the envelope timestamp.
    pub fn try_set(&self, value: &T) -> Result<i64> {
        let envelope = Envelope::new(value, self.config.version.clone());
        let json = envelope.to_json()?;
        self.host.set_item(&self.key, &json)?;
        self.log(
            LogEvent::new(Level::Info, "Item saved to storage")
                .with("timestamp", envelope.timestamp),
        );
        Ok(envelope.timestamp)
    }
}

impl<T> fmt::Debug for VersionedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedStore")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::host::MemoryStorage;
    use crate::logger::MemoryLogger;
    use serde_json::json;

    fn store<T>(
        host: &MemoryStorage,
        key: &str,
        config: StoreConfig,
    ) -> (VersionedStore<T>, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        let store =
            VersionedStore::with_logger(Arc::new(host.clone()), key, config, logger.clone());
        (store, logger)
    }

    #[test]
    fn construction_logs_key_and_version() {
        let host = MemoryStorage::new();
        let (_s, logger) = store::<u32>(&host, "k", StoreConfig::default().with_prefix("p"));
        let event = logger.last(Level::Info).unwrap();
        assert_eq!(event.message, "Storage initialized");
        assert_eq!(event.detail("key"), Some(&json!("p:k")));
        assert_eq!(event.detail("version"), Some(&json!("1.0")));
    }

    #[test]
    fn try_get_reports_malformed_envelope() {
        let host = MemoryStorage::new();
        host.set_item("k", "{not json").unwrap();
        let (s, _) = store::<u32>(&host, "k", StoreConfig::default());
        assert!(matches!(s.try_get(), Err(StorageError::MalformedEnvelope { .. })));
    }

    #[test]
    fn try_set_reports_quota_and_returns_timestamp() {
        let host = MemoryStorage::with_quota(80);
        let (s, _) = store::<String>(&host, "k", StoreConfig::default());
        let ts = s.try_set(&"small".to_string()).unwrap();
        assert!(ts > 0);
        assert!(matches!(
            s.try_set(&"x".repeat(100)),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn writes_version_from_config() {
        let host = MemoryStorage::new();
        let (s, _) = store::<u32>(&host, "k", StoreConfig::default().with_version("3"));
        s.set(&7);
        let raw: serde_json::Value =
            serde_json::from_str(&host.get_item("k").unwrap().unwrap()).unwrap();
        assert_eq!(raw["data"], json!(7));
        assert_eq!(raw["version"], json!("3"));
    }

    #[test]
    fn debug_omits_host() {
        let host = MemoryStorage::new();
        let (s, _) = store::<u32>(&host, "k", StoreConfig::default());
        assert!(format!("{s:?}").contains("\"k\""));
    }
}
