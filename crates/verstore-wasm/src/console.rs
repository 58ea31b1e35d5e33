//! ConsoleLogger: store events routed to the browser console.

use serde_json::Value;
use verstore::{Level, LogEvent, StoreLogger};
use wasm_bindgen::JsValue;
use web_sys::console;

use crate::error::to_js_value;

/// Writes `[prefix] message` plus the details object at the event's level.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new("storage")
    }
}

impl StoreLogger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        let line = JsValue::from_str(&format!("[{}] {}", self.prefix, event.message));
        let details = to_js_value(&Value::Object(event.details.clone())).unwrap_or(JsValue::NULL);
        match event.level {
            Level::Info => console::info_2(&line, &details),
            Level::Warn => console::warn_2(&line, &details),
            Level::Error => console::error_2(&line, &details),
        }
    }
}
