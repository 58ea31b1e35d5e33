//! JS-facing classes over `localStorage`: `WasmStore` and `WasmBinding`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use verstore::{StoreConfig, StoredValue, Update, VersionedStore};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::console::ConsoleLogger;
use crate::error::{from_js_value, js_message, to_js_error, to_js_value};
use crate::web::{WebStorage, WindowChanges};

/// `undefined` and `null` select the defaults; anything else must be an
/// options object `{ prefix?, version?, enableCompression? }`.
fn parse_config(options: JsValue) -> Result<StoreConfig, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(StoreConfig::default());
    }
    let value: Value = from_js_value(options)?;
    StoreConfig::from_value(&value).map_err(to_js_error)
}

fn open_store(key: &str, options: JsValue) -> Result<VersionedStore<Value>, JsValue> {
    let config = parse_config(options)?;
    let host = WebStorage::local().map_err(to_js_error)?;
    Ok(VersionedStore::with_logger(
        Arc::new(host),
        key,
        config,
        Arc::new(ConsoleLogger::default()),
    ))
}

fn optional_to_js(value: Option<Value>) -> Result<JsValue, JsValue> {
    match value {
        Some(value) => to_js_value(&value),
        None => Ok(JsValue::NULL),
    }
}

// ============================================================================
// WasmStore
// ============================================================================

/// One versioned key in `localStorage`.
#[wasm_bindgen]
pub struct WasmStore {
    inner: VersionedStore<Value>,
}

#[wasm_bindgen]
impl WasmStore {
    #[wasm_bindgen(constructor)]
    pub fn new(key: &str, options: JsValue) -> Result<WasmStore, JsValue> {
        console_error_panic_hook::set_once();
        Ok(Self {
            inner: open_store(key, options)?,
        })
    }

    /// The stored data, or `null` when absent, stale or unreadable.
    pub fn get(&self) -> Result<JsValue, JsValue> {
        optional_to_js(self.inner.get())
    }

    /// Write `value`. Host failures are logged to the console, not thrown.
    pub fn set(&self, value: JsValue) -> Result<(), JsValue> {
        let value: Value = from_js_value(value)?;
        self.inner.set(&value);
        Ok(())
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn exists(&self) -> bool {
        self.inner.exists()
    }

    /// The storage key, prefix included.
    #[wasm_bindgen(getter)]
    pub fn key(&self) -> String {
        self.inner.key().to_string()
    }
}

// ============================================================================
// WasmBinding
// ============================================================================

/// Reactive value kept in sync with `localStorage` across tabs.
#[wasm_bindgen]
pub struct WasmBinding {
    inner: StoredValue<Value>,
}

#[wasm_bindgen]
impl WasmBinding {
    #[wasm_bindgen(constructor)]
    pub fn new(
        key: &str,
        default_value: JsValue,
        options: JsValue,
    ) -> Result<WasmBinding, JsValue> {
        console_error_panic_hook::set_once();
        let default: Value = from_js_value(default_value)?;
        let store = open_store(key, options)?;
        let changes = WindowChanges::new().map_err(to_js_error)?;
        let inner = StoredValue::attach(store, default, &changes).map_err(to_js_error)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn value(&self) -> Result<JsValue, JsValue> {
        self.inner.with(|value| to_js_value(value))
    }

    /// Accepts a value or a function of the previous value.
    ///
    /// A function runs before the write, outside any lock, so it may read
    /// `value` itself. If it throws, nothing is written.
    #[wasm_bindgen(js_name = "setValue")]
    pub fn set_value(&self, next: JsValue) -> Result<(), JsValue> {
        let update = match next.dyn_ref::<js_sys::Function>() {
            Some(f) => {
                let previous = self.inner.with(|value| to_js_value(value))?;
                let computed = f.call1(&JsValue::NULL, &previous)?;
                Update::Literal(from_js_value(computed)?)
            }
            None => Update::Literal(from_js_value(next)?),
        };
        self.inner.set_value(update);
        Ok(())
    }

    #[wasm_bindgen(js_name = "clearValue")]
    pub fn clear_value(&self) {
        self.inner.clear_value();
    }

    /// Call `callback(value)` on every change. Returns an unsubscribe function.
    pub fn observe(&self, callback: js_sys::Function) -> JsValue {
        let cb = Arc::new(SendSyncCallback(callback));
        let subscription = self.inner.observe(move |value: &Value| {
            let js_val = to_js_value(value).unwrap_or(JsValue::NULL);
            if let Err(thrown) = cb.0.call1(&JsValue::NULL, &js_val) {
                web_sys::console::warn_1(&JsValue::from_str(&format!(
                    "[storage] observer threw: {}",
                    js_message(&thrown)
                )));
            }
        });
        idempotent_unsub(subscription.into_fn())
    }

    #[wasm_bindgen(getter, js_name = "isAttached")]
    pub fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }

    /// Stop following other tabs. The binding is consumed.
    pub fn detach(self) {
        self.inner.detach();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Wrap a one-shot unsubscribe so calling it from JS more than once is safe.
fn idempotent_unsub(unsub: Box<dyn FnOnce()>) -> JsValue {
    let called = Rc::new(Cell::new(false));
    let unsub = Rc::new(RefCell::new(Some(unsub)));
    let closure = Closure::wrap(Box::new(move || {
        if !called.replace(true) {
            if let Some(f) = unsub.borrow_mut().take() {
                f();
            }
        }
    }) as Box<dyn FnMut()>);
    closure.into_js_value()
}

/// Send+Sync wrapper for JS callbacks in single-threaded WASM.
struct SendSyncCallback(js_sys::Function);

// SAFETY: WASM is single-threaded.
unsafe impl Send for SendSyncCallback {}
unsafe impl Sync for SendSyncCallback {}
