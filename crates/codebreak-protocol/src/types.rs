//! Identity and value types shared by every Codebreak layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of digits in a secret or a guess.
pub const CODE_LENGTH: usize = 4;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque, connection-scoped identity of a participant.
///
/// The transport assigns one per accepted connection; it is never reused
/// within a process. Serialized as a bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Short human-shareable session id, e.g. `K7PQ2X`.
///
/// Players read these aloud to each other to join a private session,
/// so the registry draws them from an alphabet without look-alike
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Score of a guess against a secret.
///
/// `value_matches` counts every digit matched by value, *including* the
/// ones already counted in `positional_matches`. So `1234` against
/// `1243` is `{ positional: 2, value: 4 }`, never `{ 2, 2 }`. Every
/// consumer (replies, notifications, transcript) uses this convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feedback {
    /// Digits equal to the secret digit at the same index.
    pub positional_matches: u8,
    /// Digits present in the secret, bounded by multiplicity.
    pub value_matches: u8,
}

impl Feedback {
    /// Returns `true` if every position matched, i.e. the code is cracked.
    pub fn is_solved(&self) -> bool {
        usize::from(self.positional_matches) == CODE_LENGTH
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in place, {} correct",
            self.positional_matches, self.value_matches
        )
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a session as seen by clients.
///
/// ```text
/// Open → Committing → InProgress → Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Zero or one participant, waiting for an opponent.
    Open,
    /// Both seats filled, secrets being committed.
    Committing,
    /// Both secrets committed, turns alternating.
    InProgress,
    /// Someone won, or a participant left mid-round.
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Committing => write!(f, "Committing"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Coarse classification of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The payload was malformed (e.g. not four digits).
    Validation,
    /// The request was well-formed but not allowed right now
    /// (wrong turn, wrong phase, duplicate commit).
    Protocol,
    /// The participant or session does not exist.
    NotFound,
}
