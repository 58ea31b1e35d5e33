//! Versioned, namespaced key-value storage over `localStorage`-style hosts.
//!
//! A [`VersionedStore`] wraps one key of a [`HostStorage`] in a JSON
//! [`Envelope`] carrying a timestamp and a version tag; reads written under
//! another version are purged. A [`StoredValue`] mirrors a store into an
//! in-memory cell and follows writes made by other contexts.
//!
//! ```
//! use std::sync::Arc;
//! use verstore::{MemoryStorage, StoreConfig, StoredValue, Update, VersionedStore};
//!
//! let storage = MemoryStorage::new();
//! let tab = storage.context();
//! let store = VersionedStore::new(Arc::new(tab.clone()), "count", StoreConfig::default());
//! let count = StoredValue::attach(store, 0u32, &tab).unwrap();
//!
//! count.set_value(Update::compute(|n| n + 1));
//! assert_eq!(count.get(), 1);
//! ```

pub mod binding;
pub mod config;
pub mod envelope;
pub mod error;
pub mod host;
pub mod logger;
pub mod store;
pub mod util;

pub use binding::{StoredValue, Update};
pub use config::{StoreConfig, DEFAULT_VERSION};
pub use envelope::Envelope;
pub use error::{Result, StorageError};
pub use host::{
    ChangeListener, ChangeSource, HostStorage, MemoryContext, MemoryStorage, StorageChange,
    Subscription,
};
pub use logger::{Level, LogEvent, MemoryLogger, StoreLogger, TracingLogger};
pub use store::VersionedStore;
