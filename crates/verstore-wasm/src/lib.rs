//! WASM bindings for verstore.
//!
//! Runs the versioned store over `window.localStorage`, follows other tabs
//! through the window `storage` event, and logs to the browser console.

mod console;
mod error;
pub mod store;
pub mod util;
pub mod web;

pub use console::ConsoleLogger;
pub use store::{WasmBinding, WasmStore};
pub use web::{WebStorage, WindowChanges};
