//! The persisted envelope: caller data plus write timestamp and version tag.
//!
//! The JSON shape is shared with every other reader of the same storage key,
//! so the field set and order are fixed: `data`, `timestamp`, then `version`
//! only when one is configured.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StorageError};

/// A stored value as it appears under its storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    /// Write time in epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl<T> Envelope<T> {
    /// Wrap `data` stamped with the current time.
    pub fn new(data: T, version: Option<String>) -> Self {
        Self {
            data,
            timestamp: now_millis(),
            version,
        }
    }

    /// True when this envelope passes the version gate for `expected`.
    ///
    /// An unversioned reader accepts anything.
    pub fn matches_version(&self, expected: Option<&str>) -> bool {
        match expected {
            None => true,
            Some(v) => self.version.as_deref() == Some(v),
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(StorageError::Serialize)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Parse a raw stored string. `key` is only used for the error.
    pub fn from_json(key: &str, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| StorageError::MalformedEnvelope {
            key: key.to_string(),
            source,
        })
    }
}

impl Envelope<Value> {
    /// Convert `data` into `T`, keeping timestamp and version.
    ///
    /// Read paths parse into `Envelope<Value>` first so the version gate
    /// runs before `data` has to fit the reader's type.
    pub fn decode<T: DeserializeOwned>(self, key: &str) -> Result<Envelope<T>> {
        let data = serde_json::from_value(self.data).map_err(|source| {
            StorageError::MalformedEnvelope {
                key: key.to_string(),
                source,
            }
        })?;
        Ok(Envelope {
            data,
            timestamp: self.timestamp,
            version: self.version,
        })
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_fields_in_fixed_order() {
        let env = Envelope {
            data: json!({ "name": "John" }),
            timestamp: 1_700_000_000_000,
            version: Some("1.0".to_string()),
        };
        assert_eq!(
            env.to_json().unwrap(),
            r#"{"data":{"name":"John"},"timestamp":1700000000000,"version":"1.0"}"#
        );
    }

    #[test]
    fn omits_version_when_unversioned() {
        let env = Envelope {
            data: 42,
            timestamp: 5,
            version: None,
        };
        let value: Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(!obj.contains_key("version"));
    }

    #[test]
    fn missing_timestamp_is_malformed() {
        let err = Envelope::<String>::from_json("k", r#"{"data":"x"}"#).unwrap_err();
        assert!(matches!(err, StorageError::MalformedEnvelope { ref key, .. } if key == "k"));
    }

    #[test]
    fn data_of_wrong_type_is_malformed() {
        let raw = r#"{"data":"not a number","timestamp":1}"#;
        assert!(Envelope::<u32>::from_json("k", raw).is_err());
    }

    #[test]
    fn header_parses_even_when_data_does_not_fit() {
        let raw = r#"{"data":"text","timestamp":3,"version":"1.0"}"#;
        let env = Envelope::<Value>::from_json("k", raw).unwrap();
        assert!(!env.matches_version(Some("2.0")));
        assert_eq!(env.timestamp, 3);

        let err = env.decode::<u64>("k").unwrap_err();
        assert!(matches!(err, StorageError::MalformedEnvelope { ref key, .. } if key == "k"));
    }

    #[test]
    fn decode_keeps_header_fields() {
        let raw = r#"{"data":[1,2],"timestamp":9,"version":"2.0"}"#;
        let env = Envelope::<Value>::from_json("k", raw)
            .unwrap()
            .decode::<Vec<u8>>("k")
            .unwrap();
        assert_eq!(env.data, vec![1, 2]);
        assert_eq!(env.timestamp, 9);
        assert_eq!(env.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn missing_data_is_malformed() {
        let err = Envelope::<Value>::from_json("k", r#"{"timestamp":1}"#).unwrap_err();
        assert!(matches!(err, StorageError::MalformedEnvelope { .. }));
    }

    #[test]
    fn extra_fields_are_ignored_on_read() {
        let raw = r#"{"data":1,"timestamp":2,"version":"1.0","extra":true}"#;
        let env = Envelope::<u32>::from_json("k", raw).unwrap();
        assert_eq!(env.data, 1);
        assert_eq!(env.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn version_gate() {
        let env = Envelope {
            data: (),
            timestamp: 0,
            version: Some("1.0".to_string()),
        };
        assert!(env.matches_version(None));
        assert!(env.matches_version(Some("1.0")));
        assert!(!env.matches_version(Some("2.0")));

        let bare = Envelope {
            data: (),
            timestamp: 0,
            version: None,
        };
        assert!(!bare.matches_version(Some("1.0")));
    }

    #[test]
    fn new_stamps_current_time() {
        let before = now_millis();
        let env = Envelope::new("x", None);
        assert!(env.timestamp >= before);
    }
}
