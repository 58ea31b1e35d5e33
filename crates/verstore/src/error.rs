use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Malformed envelope at \"{key}\": {source}")]
    MalformedEnvelope {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage quota exceeded writing \"{key}\" ({needed} bytes)")]
    QuotaExceeded { key: String, needed: usize },

    #[error("Storage access denied: {0}")]
    AccessDenied(String),

    #[error("Host storage error: {0}")]
    Host(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Failed to register change listener: {0}")]
    ListenerRegistration(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
