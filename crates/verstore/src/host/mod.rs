//! Host storage capability and cross-context change notifications.
//!
//! The store never touches a concrete backend. Browser builds plug in
//! `window.localStorage`; native builds and tests use [`MemoryStorage`].

pub mod memory;
pub mod subscription;

use std::sync::Arc;

use crate::error::Result;

pub use memory::{MemoryContext, MemoryStorage};
pub use subscription::Subscription;

// ============================================================================
// HostStorage: synchronous string → string mapping
// ============================================================================

/// A synchronous, string-keyed, string-valued persistent mapping.
///
/// Mirrors the Web Storage API (`getItem` / `setItem` / `removeItem`). Every
/// call completes or fails immediately.
pub trait HostStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// May fail, e.g. with `StorageError::QuotaExceeded`.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<S: HostStorage + ?Sized> HostStorage for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

// ============================================================================
// ChangeSource: notifications from other execution contexts
// ============================================================================

/// A mutation made by another execution context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// `None` when the whole storage area was cleared.
    pub key: Option<String>,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

impl StorageChange {
    pub fn is_for(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

pub type ChangeListener = Arc<dyn Fn(&StorageChange) + Send + Sync>;

/// Stream of [`StorageChange`]s made by other contexts.
pub trait ChangeSource: Send + Sync {
    /// Register `listener`. It stays registered until the returned guard is
    /// dropped or unsubscribed.
    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription>;
}

impl<S: ChangeSource + ?Sized> ChangeSource for Arc<S> {
    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription> {
        (**self).subscribe(listener)
    }
}
