//! Error types for the protocol layer.

/// Errors raised while turning frames into bytes and back.
///
/// Game-rule rejections are not protocol errors; they travel inside a
/// [`Reply::Rejected`](crate::Reply::Rejected) frame instead.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A frame could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Incoming bytes were not a valid frame (malformed JSON, unknown
    /// `type` tag, missing field).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
