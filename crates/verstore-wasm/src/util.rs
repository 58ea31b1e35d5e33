//! Helper functions exported alongside the store classes.

use verstore::util::{self, DateStyle};
use verstore::StorageError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::to_js_error;

#[wasm_bindgen(js_name = "generateId")]
pub fn wasm_generate_id() -> String {
    util::generate_id()
}

/// Accepts epoch milliseconds, a `Date`, or a date string.
#[wasm_bindgen(js_name = "formatDate")]
pub fn wasm_format_date(date: JsValue) -> Result<String, JsValue> {
    if let Some(d) = date.dyn_ref::<js_sys::Date>() {
        return format_finite_millis(d.get_time());
    }
    if let Some(millis) = date.as_f64() {
        return format_finite_millis(millis);
    }
    let text = date
        .as_string()
        .ok_or_else(|| JsValue::from_str("formatDate expects a Date, number or string"))?;
    let parsed = util::parse_date(&text).map_err(to_js_error)?;
    Ok(util::format_date(&parsed))
}

/// `NaN` and infinities (an invalid `Date` included) are rejected rather than
/// truncated to the epoch.
fn format_finite_millis(millis: f64) -> Result<String, JsValue> {
    if !millis.is_finite() {
        return Err(to_js_error(StorageError::InvalidDate(format!(
            "not a finite timestamp: {millis}"
        ))));
    }
    util::format_millis(millis as i64, DateStyle::Long).map_err(to_js_error)
}

/// Merge class names; non-string and empty entries are skipped.
#[wasm_bindgen(js_name = "classNames")]
pub fn wasm_class_names(inputs: Vec<JsValue>) -> String {
    let names: Vec<Option<String>> = inputs.iter().map(JsValue::as_string).collect();
    util::class_names(names.iter().map(Option::as_deref))
}
