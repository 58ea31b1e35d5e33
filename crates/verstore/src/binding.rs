//! StoredValue<T>: an in-memory cell mirroring one stored value.
//!
//! Writes go through the cell to storage synchronously. Changes written by
//! other contexts arrive through a [`ChangeSource`] and replace the cell's
//! value; the last notification observed wins.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::host::{ChangeSource, StorageChange, Subscription};
use crate::store::VersionedStore;

// ============================================================================
// Update
// ============================================================================

/// The next value for [`StoredValue::set_value`].
pub enum Update<T> {
    /// Replace the value.
    Literal(T),
    /// Derive the next value from the current one.
    Compute(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    pub fn literal(value: T) -> Self {
        Update::Literal(value)
    }

    pub fn compute(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Update::Compute(Box::new(f))
    }

    fn apply(self, prev: &T) -> T {
        match self {
            Update::Literal(value) => value,
            Update::Compute(f) => f(prev),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Update::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

// ============================================================================
// Shared cell
// ============================================================================

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Cell<T> {
    value: Mutex<T>,
    observers: Mutex<Vec<(u64, Observer<T>)>>,
    next_observer_id: AtomicU64,
}

impl<T: Clone> Cell<T> {
    fn replace(&self, value: T) {
        *self.value.lock() = value.clone();
        self.notify(&value);
    }

    /// Run observers with no lock held.
    fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(value);
        }
    }
}

// ============================================================================
// StoredValue
// ============================================================================

/// A reactive binding to one [`VersionedStore`].
///
/// Owns its store and its change subscription; dropping the binding (or
/// calling [`StoredValue::detach`]) releases the subscription.
pub struct StoredValue<T> {
    store: VersionedStore<T>,
    default: T,
    cell: Arc<Cell<T>>,
    subscription: Subscription,
}

impl<T> StoredValue<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    /// Seed the cell from storage (or `default`) and start listening to
    /// `changes`.
    ///
    /// Fails only when the listener cannot be registered; in that case
    /// nothing stays registered.
    pub fn attach(
        store: VersionedStore<T>,
        default: T,
        changes: &dyn ChangeSource,
    ) -> Result<Self> {
        let initial = store.get().unwrap_or_else(|| default.clone());
        let cell = Arc::new(Cell {
            value: Mutex::new(initial),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
        });

        let key = store.key().to_string();
        let weak = Arc::downgrade(&cell);
        let subscription = changes.subscribe(Arc::new(move |change: &StorageChange| {
            adopt_change(&weak, &key, change);
        }))?;

        Ok(Self {
            store,
            default,
            cell,
            subscription,
        })
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.cell.value.lock().clone()
    }

    /// Borrow the current value without cloning it.
    ///
    /// `f` runs under the cell lock and must not call back into this binding.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.value.lock())
    }

    /// Compute the next value and update the cell, then write it through to
    /// storage and notify observers.
    ///
    /// A computed update runs under the cell lock and must not call back
    /// into this binding. The write and its log events happen after the lock
    /// is released.
    pub fn set_value(&self, update: Update<T>) {
        let next = {
            let mut value = self.cell.value.lock();
            let next = update.apply(&value);
            *value = next.clone();
            next
        };
        self.store.set(&next);
        self.cell.notify(&next);
    }

    pub fn set(&self, value: T) {
        self.set_value(Update::Literal(value));
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.set_value(Update::compute(f));
    }

    /// Remove the stored value and reset the cell to the default.
    pub fn clear_value(&self) {
        self.store.clear();
        self.cell.replace(self.default.clone());
    }

    /// Call `observer` with the new value after every change to the cell.
    pub fn observe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.cell.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.cell.observers.lock().push((id, Arc::new(observer)));

        let weak = Arc::downgrade(&self.cell);
        Subscription::new(move || {
            if let Some(cell) = weak.upgrade() {
                cell.observers.lock().retain(|(oid, _)| *oid != id);
            }
        })
    }
}

impl<T> StoredValue<T> {
    pub fn store(&self) -> &VersionedStore<T> {
        &self.store
    }

    pub fn key(&self) -> &str {
        self.store.key()
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop listening for changes from other contexts.
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}

impl<T: fmt::Debug> fmt::Debug for StoredValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredValue")
            .field("key", &self.store.key())
            .field("value", &*self.cell.value.lock())
            .field("attached", &self.subscription.is_active())
            .finish()
    }
}

/// Adopt the data of a change to `key`, if it parses as an envelope.
///
/// Removals, empty values and unparseable values are ignored.
fn adopt_change<T>(cell: &Weak<Cell<T>>, key: &str, change: &StorageChange)
where
    T: Clone + DeserializeOwned,
{
    if !change.is_for(key) {
        return;
    }
    let Some(raw) = change.new_value.as_deref().filter(|raw| !raw.is_empty()) else {
        return;
    };
    let Ok(envelope) = serde_json::from_str::<Envelope<T>>(raw) else {
        return;
    };
    if let Some(cell) = cell.upgrade() {
        cell.replace(envelope.data);
    }
}
