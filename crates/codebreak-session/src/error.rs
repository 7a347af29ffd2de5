//! Error types for the session layer.

use codebreak_protocol::{ErrorKind, ParticipantId, SessionId};

use crate::CodeError;

/// Why a session or registry operation was rejected.
///
/// Every variant is recoverable: the operation that produced it left all
/// state untouched, and the caller may resubmit a corrected request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The submitted code was not four decimal digits.
    #[error("invalid code: {0}")]
    InvalidCode(#[from] CodeError),

    /// A guess came from the participant not holding the turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// A guess arrived before both secrets were committed.
    #[error("the game has not started")]
    GameNotStarted,

    /// The session has already ended.
    #[error("the game is over")]
    GameOver,

    /// A secret was committed before an opponent joined.
    #[error("waiting for an opponent to join")]
    WaitingForOpponent,

    /// The participant already committed a secret.
    #[error("secret already committed")]
    AlreadyCommitted,

    /// The opponent's secret could not be found while scoring. Only
    /// reachable through an internal invariant breach; the session is
    /// closed when it happens.
    #[error("opponent secret missing")]
    OpponentSecretMissing,

    /// Both seats of the session are taken (or it has started).
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The participant is already seated in a session.
    #[error("participant {0} already in session {1}")]
    AlreadyInSession(ParticipantId, SessionId),

    /// The participant is not seated in any session.
    #[error("participant {0} is not in a session")]
    NotInSession(ParticipantId),

    /// No session with this id exists.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The registry actor has stopped or its queue is closed.
    #[error("session registry is unavailable")]
    Unavailable,
}

impl SessionError {
    /// Coarse classification used in client-facing rejections.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCode(_) => ErrorKind::Validation,
            Self::NotInSession(_) | Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::NotYourTurn
            | Self::GameNotStarted
            | Self::GameOver
            | Self::WaitingForOpponent
            | Self::AlreadyCommitted
            | Self::OpponentSecretMissing
            | Self::SessionFull(_)
            | Self::AlreadyInSession(..)
            | Self::Unavailable => ErrorKind::Protocol,
        }
    }

    /// Stable machine-readable code, e.g. `not_your_turn`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCode(_) => "invalid_code",
            Self::NotYourTurn => "not_your_turn",
            Self::GameNotStarted => "game_not_started",
            Self::GameOver => "game_over",
            Self::WaitingForOpponent => "waiting_for_opponent",
            Self::AlreadyCommitted => "already_committed",
            Self::OpponentSecretMissing => "opponent_secret_missing",
            Self::SessionFull(_) => "session_full",
            Self::AlreadyInSession(..) => "already_in_session",
            Self::NotInSession(_) => "not_in_session",
            Self::SessionNotFound(_) => "session_not_found",
            Self::Unavailable => "unavailable",
        }
    }
}
