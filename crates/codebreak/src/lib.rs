//! # Codebreak
//!
//! Server for a two-player code-breaking game. Each player commits a hidden
//! 4-digit code; players take turns guessing the opponent's code and get
//! back how many digits are right and how many are in the right place.
//!
//! This crate ties the layers together:
//! transport → protocol → session registry actor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codebreak::prelude::*;
//!
//! # async fn run() -> Result<(), CodebreakError> {
//! let server = CodebreakServer::builder()
//!     .bind("0.0.0.0:4000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::CodebreakError;
pub use server::{CodebreakServer, CodebreakServerBuilder, DEFAULT_BIND_ADDR};

/// Common imports for embedding or testing a Codebreak server.
pub mod prelude {
    pub use crate::{CodebreakError, CodebreakServer, CodebreakServerBuilder};
    pub use codebreak_protocol::{
        ClientFrame, Codec, ErrorKind, Feedback, Intent, JsonCodec, Notification,
        PROTOCOL_VERSION, ParticipantId, Phase, Reply, ServerFrame, SessionId,
        SessionSnapshot,
    };
    pub use codebreak_session::{RegistryConfig, RegistryHandle, SessionError};
    pub use codebreak_transport::{Connection, MemoryConnection, TransportError};
}
