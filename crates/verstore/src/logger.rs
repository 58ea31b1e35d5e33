//! Structured logging collaborator injected into every store.
//!
//! Stores never reach for a global logger; they hold an
//! `Arc<dyn StoreLogger>`. [`TracingLogger`] is the default and forwards to
//! `tracing`. [`MemoryLogger`] records events for inspection.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

/// Target used for every `tracing` event emitted by [`TracingLogger`].
pub const LOG_TARGET: &str = "verstore::storage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        })
    }
}

/// One structured log event: a message plus a details mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: Level,
    pub message: String,
    pub details: Map<String, Value>,
}

impl LogEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Fire-and-forget sink for store events. Implementations must not panic.
pub trait StoreLogger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

// ============================================================================
// TracingLogger
// ============================================================================

/// Forwards events to `tracing` under [`LOG_TARGET`].
#[derive(Debug, Clone)]
pub struct TracingLogger {
    prefix: String,
}

impl TracingLogger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn shared(prefix: impl Into<String>) -> Arc<dyn StoreLogger> {
        Arc::new(Self::new(prefix))
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("storage")
    }
}

impl StoreLogger for TracingLogger {
    fn log(&self, event: &LogEvent) {
        let details = Value::Object(event.details.clone());
        match event.level {
            Level::Info => tracing::info!(
                target: LOG_TARGET,
                prefix = %self.prefix,
                details = %details,
                "{}",
                event.message
            ),
            Level::Warn => tracing::warn!(
                target: LOG_TARGET,
                prefix = %self.prefix,
                details = %details,
                "{}",
                event.message
            ),
            Level::Error => tracing::error!(
                target: LOG_TARGET,
                prefix = %self.prefix,
                details = %details,
                "{}",
                event.message
            ),
        }
    }
}

// ============================================================================
// MemoryLogger
// ============================================================================

/// Records every event in order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }

    /// Most recent event at `level`, if any.
    pub fn last(&self, level: Level) -> Option<LogEvent> {
        self.events
            .lock()
            .iter()
            .rev()
            .find(|e| e.level == level)
            .cloned()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl StoreLogger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        self.events.lock().push(event.clone());
    }
}
