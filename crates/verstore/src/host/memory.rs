//! MemoryStorage: an in-process storage area shared by several contexts.
//!
//! Each [`MemoryContext`] plays the part of one browser tab: it reads and
//! writes the shared area, and writes made by one context are announced to
//! every *other* live context. Announcements are queued per context and only
//! delivered when that context calls [`MemoryContext::flush`], the way a tab
//! processes `storage` events from its own event loop.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{Result, StorageError};

use super::{ChangeListener, ChangeSource, HostStorage, StorageChange, Subscription};

// ============================================================================
// Shared area
// ============================================================================

struct Area {
    entries: Mutex<HashMap<String, String>>,
    /// Byte cap on the sum of key and value lengths.
    quota: Option<usize>,
    contexts: Mutex<Vec<Weak<ContextState>>>,
    next_context_id: AtomicU64,
}

impl Area {
    /// Queue `change` in every live context except `origin`.
    ///
    /// Contexts with no listeners are skipped so an idle context never
    /// accumulates a backlog.
    fn announce(&self, origin: Option<u64>, change: StorageChange) {
        let mut contexts = self.contexts.lock();
        contexts.retain(|weak| weak.strong_count() > 0);
        for ctx in contexts.iter().filter_map(Weak::upgrade) {
            if Some(ctx.id) != origin && !ctx.listeners.lock().is_empty() {
                ctx.queue.lock().push_back(change.clone());
            }
        }
    }

    fn set(&self, origin: Option<u64>, key: &str, value: &str) -> Result<()> {
        let old = {
            let mut entries = self.entries.lock();
            if let Some(quota) = self.quota {
                let used: usize = entries
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let needed = key.len() + value.len();
                if used + needed > quota {
                    return Err(StorageError::QuotaExceeded {
                        key: key.to_string(),
                        needed,
                    });
                }
            }
            if entries.get(key).is_some_and(|existing| existing == value) {
                return Ok(());
            }
            entries.insert(key.to_string(), value.to_string())
        };
        self.announce(
            origin,
            StorageChange {
                key: Some(key.to_string()),
                old_value: old,
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove(&self, origin: Option<u64>, key: &str) {
        let old = self.entries.lock().remove(key);
        if old.is_some() {
            self.announce(
                origin,
                StorageChange {
                    key: Some(key.to_string()),
                    old_value: old,
                    new_value: None,
                },
            );
        }
    }

    fn clear(&self, origin: Option<u64>) {
        let had_entries = {
            let mut entries = self.entries.lock();
            let had = !entries.is_empty();
            entries.clear();
            had
        };
        if had_entries {
            self.announce(
                origin,
                StorageChange {
                    key: None,
                    old_value: None,
                    new_value: None,
                },
            );
        }
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// Handle to a shared in-memory storage area. Cheap to clone.
///
/// Writes made directly through this handle belong to no context and are
/// announced to every context.
#[derive(Clone)]
pub struct MemoryStorage {
    area: Arc<Area>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// An unbounded area.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// An area that rejects writes once keys and values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    fn build(quota: Option<usize>) -> Self {
        Self {
            area: Arc::new(Area {
                entries: Mutex::new(HashMap::new()),
                quota,
                contexts: Mutex::new(Vec::new()),
                next_context_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new execution context on this area.
    pub fn context(&self) -> MemoryContext {
        let state = Arc::new(ContextState {
            id: self.area.next_context_id.fetch_add(1, Ordering::Relaxed),
            queue: Mutex::new(VecDeque::new()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        });
        self.area.contexts.lock().push(Arc::downgrade(&state));
        MemoryContext {
            area: Arc::clone(&self.area),
            state,
        }
    }

    pub fn len(&self) -> usize {
        self.area.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.area.entries.lock().is_empty()
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.area.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove every entry, announcing a whole-area clear.
    pub fn clear_all(&self) {
        self.area.clear(None);
    }
}

impl HostStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.area.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.area.set(None, key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.area.remove(None, key);
        Ok(())
    }
}

// ============================================================================
// MemoryContext
// ============================================================================

struct ContextState {
    id: u64,
    queue: Mutex<VecDeque<StorageChange>>,
    listeners: Mutex<Vec<(u64, ChangeListener)>>,
    next_listener_id: AtomicU64,
}

/// One execution context on a [`MemoryStorage`] area.
///
/// Clones share the same context: same queue, same listeners.
#[derive(Clone)]
pub struct MemoryContext {
    area: Arc<Area>,
    state: Arc<ContextState>,
}

impl MemoryContext {
    /// Deliver queued changes to this context's listeners.
    ///
    /// Changes are only queued while the context has at least one listener.
    ///
    /// Listeners run with no lock held, so they may read or write storage.
    /// Returns the number of changes delivered.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let Some(change) = self.state.queue.lock().pop_front() else {
                return delivered;
            };
            let listeners: Vec<ChangeListener> = self
                .state
                .listeners
                .lock()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            for listener in listeners {
                listener(&change);
            }
            delivered += 1;
        }
    }

    /// Number of changes waiting for [`MemoryContext::flush`].
    pub fn pending(&self) -> usize {
        self.state.queue.lock().len()
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.lock().len()
    }

    /// Remove every entry in the shared area, announcing it to the other
    /// contexts.
    pub fn clear_all(&self) {
        self.area.clear(Some(self.state.id));
    }
}

impl HostStorage for MemoryContext {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.area.entries.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.area.set(Some(self.state.id), key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.area.remove(Some(self.state.id), key);
        Ok(())
    }
}

impl ChangeSource for MemoryContext {
    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription> {
        let id = self.state.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.state.listeners.lock().push((id, listener));

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        }))
    }
}
