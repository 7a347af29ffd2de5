//! Wire protocol for Codebreak.
//!
//! This crate defines everything that crosses the boundary between the
//! game core and the outside world:
//!
//! - **Types** ([`ParticipantId`], [`SessionId`], [`Feedback`], ...):
//!   identities and values shared by every layer.
//! - **Messages** ([`Intent`], [`Reply`], [`Notification`], frames):
//!   what clients ask for and what the server tells them.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]): encode/decode failures.
//!
//! ```text
//! Transport (bytes) → Protocol (frames) → Session core (intents, notifications)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    ClientFrame, Intent, Notification, ParticipantView, Reply, ServerFrame,
    SessionSnapshot, TranscriptEntry,
};
pub use types::{
    CODE_LENGTH, ErrorKind, Feedback, ParticipantId, Phase, SessionId,
};

/// The current protocol version, announced in [`ServerFrame::Welcome`].
pub const PROTOCOL_VERSION: u32 = 1;
