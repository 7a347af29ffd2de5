//! Session core for Codebreak.
//!
//! Two participants are paired into a [`Session`], each commits a hidden
//! 4-digit [`Code`], and they take turns guessing each other's code. Every
//! guess is scored by the feedback engine ([`score`]).
//!
//! # Key types
//!
//! - [`SessionRegistry`]: owns all sessions, matchmaking, participant lookup
//! - [`Session`]: one game's lifecycle state machine
//! - [`SessionState`]: `Open → Committing → InProgress → Terminated`
//! - [`RegistryHandle`]: async front end to a registry running as an actor
//! - [`RegistryConfig`]: transcript and naming limits
//!
//! # Concurrency
//!
//! [`SessionRegistry`] is a plain single-owner struct. To share it between
//! connection tasks, hand it to [`spawn_registry`]: one Tokio task then
//! owns it and applies commands one at a time, which serializes every
//! admission and every session transition.

mod actor;
mod code;
mod config;
mod error;
mod feedback;
mod registry;
mod session;
mod transcript;

pub use actor::{NotificationSender, RegistryHandle, RegistryInfo, spawn_registry};
pub use code::{Code, CodeError};
pub use config::{Ending, RegistryConfig, Seat, SessionState};
pub use error::SessionError;
pub use feedback::score;
pub use registry::SessionRegistry;
pub use session::{Delivery, Participant, Session};
pub use transcript::Transcript;
