//! `data:` URL encoding for binary payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Result, StorageError};

/// Encode `bytes` as `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URL into its MIME type and bytes.
pub fn from_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| StorageError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| StorageError::InvalidDataUrl("missing payload separator".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| {
            StorageError::InvalidDataUrl("only base64 payloads are supported".to_string())
        })?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| StorageError::InvalidDataUrl(e.to_string()))?;
    Ok((mime.to_string(), bytes))
}
