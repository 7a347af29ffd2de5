//! Registry configuration and the session state machine.

use std::fmt;

use codebreak_protocol::{ParticipantId, Phase};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Limits applied to every session a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Transcript entries kept per session; the oldest are evicted first.
    pub transcript_capacity: usize,

    /// Transcript entries included in a [`SessionSnapshot`](codebreak_protocol::SessionSnapshot).
    pub snapshot_tail: usize,

    /// Display names longer than this many characters are truncated.
    pub max_name_len: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            transcript_capacity: 200,
            snapshot_tail: 50,
            max_name_len: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// One of the two participant slots of a session.
///
/// Seat order is stable for the life of a session: the first joiner sits
/// in [`Seat::First`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Both seats, in order.
    pub const BOTH: [Seat; 2] = [Seat::First, Seat::Second];

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// `winner` matched every position of the opponent's secret.
    Won { winner: ParticipantId },
    /// `by` left before the round finished.
    Abandoned { by: ParticipantId },
    /// Closed after an internal invariant breach.
    Aborted,
}

/// The lifecycle state of a session.
///
/// ```text
/// Open ──join──→ Committing ──2nd commit──→ InProgress ──win──→ Terminated
///                     │                         │
///                     └──────── departure ──────┴──────────────→ Terminated
/// ```
///
/// The turn holder lives inside `InProgress`, so there is no way to hold a
/// turn outside a running game, and only the session's transition methods
/// ever change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Zero or one participant.
    Open,
    /// Two participants, fewer than two secrets committed.
    Committing,
    /// Both secrets committed; `turn` may guess.
    InProgress { turn: Seat },
    /// Finished. Never left once entered.
    Terminated(Ending),
}

impl SessionState {
    /// Returns `true` if a second participant may still take a seat.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` once the session has ended for any reason.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// The seat holding the turn, if a game is running.
    pub fn turn(&self) -> Option<Seat> {
        match self {
            Self::InProgress { turn } => Some(*turn),
            _ => None,
        }
    }

    /// The client-facing phase.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Open => Phase::Open,
            Self::Committing => Phase::Committing,
            Self::InProgress { .. } => Phase::InProgress,
            Self::Terminated(_) => Phase::Terminated,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.phase(), f)
    }
}
