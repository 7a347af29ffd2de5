//! Unified error type for the Codebreak server.

use codebreak_protocol::ProtocolError;
use codebreak_session::SessionError;
use codebreak_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CodebreakError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session registry rejected a request or has stopped.
    #[error(transparent)]
    Session(#[from] SessionError),
}
