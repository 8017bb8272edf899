//! Error types for the wire layer.

use thiserror::Error;

/// Errors that can occur while encoding, decoding or parsing wire data.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[source] serde_json::Error),

    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// Room id is not a valid identifier
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    /// Invalid data format
    #[error("invalid data: {0}")]
    InvalidData(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WireError::InvalidRoomId("has space".into());
        assert_eq!(err.to_string(), "invalid room id: has space");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WireError>();
    }
}
