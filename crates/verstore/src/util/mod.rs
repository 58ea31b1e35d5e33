//! Small helpers that travel with the store: dates, ids, class names,
//! rate limiting, data URLs.

pub mod classes;
pub mod data_url;
pub mod date;
pub mod id;
#[cfg(not(target_arch = "wasm32"))]
pub mod timing;

pub use classes::class_names;
pub use data_url::{from_data_url, to_data_url};
pub use date::{format_date, format_date_with, format_millis, parse_date, DateStyle};
pub use id::generate_id;
#[cfg(not(target_arch = "wasm32"))]
pub use timing::{Debouncer, Throttle};
