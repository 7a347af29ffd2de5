//! Codec trait and the JSON implementation.
//!
//! The server never touches `serde_json` directly: it encodes
//! [`ServerFrame`](crate::ServerFrame)s and decodes
//! [`ClientFrame`](crate::ClientFrame)s through a [`Codec`], so a binary
//! format can be swapped in without changing the handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back to values.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into an owned value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// JSON keeps the protocol readable from browser DevTools, which matters
/// more than frame size for a turn-based game.
///
/// ```rust
/// use codebreak_protocol::{ClientFrame, Codec, Intent, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = ClientFrame {
///     request_id: 7,
///     intent: Intent::Guess { code: "1234".into() },
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: ClientFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
