//! Browser hosts: `window.localStorage` and the window `storage` event.

use verstore::{
    ChangeListener, ChangeSource, HostStorage, Result, StorageChange, StorageError, Subscription,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DomException, Storage, StorageEvent, Window};

use crate::error::js_message;

const STORAGE_EVENT: &str = "storage";

fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| StorageError::AccessDenied("no global window".to_string()))
}

/// Map a thrown DOM exception onto a storage error.
fn host_error(key: &str, attempted: usize, thrown: JsValue) -> StorageError {
    match thrown.dyn_ref::<DomException>() {
        Some(exception) => match exception.name().as_str() {
            "QuotaExceededError" | "NS_ERROR_DOM_QUOTA_REACHED" => StorageError::QuotaExceeded {
                key: key.to_string(),
                needed: attempted,
            },
            "SecurityError" => StorageError::AccessDenied(exception.message()),
            _ => StorageError::Host(exception.message()),
        },
        None => StorageError::Host(js_message(&thrown)),
    }
}

// ============================================================================
// WebStorage
// ============================================================================

/// `HostStorage` over a DOM `Storage` object.
pub struct WebStorage {
    storage: Storage,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for WebStorage {}
unsafe impl Sync for WebStorage {}

impl WebStorage {
    /// The window's `localStorage`.
    ///
    /// Fails with `AccessDenied` when storage is disabled (private browsing,
    /// sandboxed iframes).
    pub fn local() -> Result<Self> {
        let storage = window()?
            .local_storage()
            .map_err(|thrown| host_error("", 0, thrown))?
            .ok_or_else(|| StorageError::AccessDenied("localStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }

    pub fn from_storage(storage: Storage) -> Self {
        Self { storage }
    }
}

impl HostStorage for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|thrown| host_error(key, 0, thrown))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|thrown| host_error(key, key.len() + value.len(), thrown))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|thrown| host_error(key, 0, thrown))
    }
}

// ============================================================================
// WindowChanges
// ============================================================================

/// `ChangeSource` over the window `storage` event.
///
/// Browsers fire the event only in other tabs of the same origin, so a
/// context never hears its own writes.
pub struct WindowChanges {
    window: Window,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for WindowChanges {}
unsafe impl Sync for WindowChanges {}

impl WindowChanges {
    pub fn new() -> Result<Self> {
        Ok(Self { window: window()? })
    }
}

/// A registered listener; removed from the window on release.
struct Registration {
    window: Window,
    closure: Closure<dyn FnMut(StorageEvent)>,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for Registration {}

impl Registration {
    fn release(self) {
        let removed = self.window.remove_event_listener_with_callback(
            STORAGE_EVENT,
            self.closure.as_ref().unchecked_ref(),
        );
        if let Err(thrown) = removed {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "[storage] failed to remove storage listener: {}",
                js_message(&thrown)
            )));
        }
    }
}

impl ChangeSource for WindowChanges {
    fn subscribe(&self, listener: ChangeListener) -> Result<Subscription> {
        let closure = Closure::<dyn FnMut(StorageEvent)>::new(move |event: StorageEvent| {
            listener(&StorageChange {
                key: event.key(),
                old_value: event.old_value(),
                new_value: event.new_value(),
            });
        });
        self.window
            .add_event_listener_with_callback(STORAGE_EVENT, closure.as_ref().unchecked_ref())
            .map_err(|thrown| StorageError::ListenerRegistration(js_message(&thrown)))?;

        let registration = Registration {
            window: self.window.clone(),
            closure,
        };
        Ok(Subscription::new(move || registration.release()))
    }
}
