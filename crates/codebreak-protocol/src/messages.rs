//! Frames exchanged between clients and the server.
//!
//! Every enum here is internally tagged with `"type"`, so a guess looks
//! like `{"type":"Guess","code":"1234"}` on the wire. That keeps the
//! client side a plain `switch (msg.type)`.

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, Feedback, ParticipantId, Phase, SessionId};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// What a participant asks the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Intent {
    /// Pair me with whoever has been waiting longest, or open a new
    /// session and wait.
    Join {
        #[serde(default)]
        name: Option<String>,
    },

    /// Open a private session that matchmaking never fills; share the id.
    CreateSession {
        #[serde(default)]
        name: Option<String>,
    },

    /// Join a specific session by id.
    JoinSession {
        session_id: SessionId,
        #[serde(default)]
        name: Option<String>,
    },

    /// Commit my hidden code. Accepted once.
    CommitSecret { code: String },

    /// Guess the opponent's code. Only valid on my turn.
    Guess { code: String },

    /// Leave my session. Always succeeds.
    Leave,
}

/// A request from the client, tagged with an id the reply will echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Client-chosen correlation id. `0` is reserved for replies to
    /// frames that could not be decoded.
    pub request_id: u64,
    /// The requested operation.
    pub intent: Intent,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Direct answer to one [`ClientFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// Placed in a session.
    Joined { session_id: SessionId },
    /// Secret accepted.
    Committed,
    /// Guess accepted and scored.
    Scored { feedback: Feedback },
    /// Left (or was not in) a session.
    Left,
    /// The request was refused; nothing changed on the server.
    Rejected {
        kind: ErrorKind,
        /// Stable machine-readable code, e.g. `not_your_turn`.
        code: String,
        /// Human-readable explanation.
        message: String,
    },
}

/// Public view of one seated participant. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    /// `true` once this participant has committed a secret.
    pub ready: bool,
}

/// One line of a session's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unix epoch milliseconds.
    pub at_ms: u64,
    pub text: String,
}

/// Sanitized view of a session, safe to send to either participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub phase: Phase,
    /// Seated participants in seat order.
    pub participants: Vec<ParticipantView>,
    /// Current turn holder, only while in progress.
    pub turn: Option<ParticipantId>,
    /// Most recent transcript entries, oldest first.
    pub transcript: Vec<TranscriptEntry>,
}

/// Something that happened in a participant's session.
///
/// Pushed by the server without a matching request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// You are alone in the session; waiting for an opponent.
    Waiting { session_id: SessionId },

    /// Both seats are filled. Commit your secret.
    Paired {
        session_id: SessionId,
        opponent: ParticipantView,
    },

    /// A participant committed their secret (the code is not included).
    SecretCommitted {
        participant_id: ParticipantId,
        name: String,
    },

    /// Both secrets are in; `starting` holds the first turn.
    GameStarted {
        starting: ParticipantId,
        name: String,
    },

    /// Result of your own guess.
    YourGuess { guess: String, feedback: Feedback },

    /// Your opponent guessed at your secret.
    OpponentGuessed {
        by: ParticipantId,
        name: String,
        guess: String,
        feedback: Feedback,
    },

    /// The turn passed to `turn`.
    TurnChanged { turn: ParticipantId },

    /// `winner` cracked the opponent's code. The session is over.
    GameWon {
        winner: ParticipantId,
        name: String,
    },

    /// Your opponent left. The session is over.
    OpponentLeft {
        participant_id: ParticipantId,
        name: String,
    },

    /// The server closed the session for another reason.
    SessionClosed { reason: String },

    /// Fresh snapshot after a state change.
    SessionUpdate { snapshot: SessionSnapshot },
}

/// Everything the server writes to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// First frame on every connection.
    Welcome {
        participant_id: ParticipantId,
        protocol_version: u32,
    },
    /// Answer to the client frame with the same `request_id`.
    Reply { request_id: u64, reply: Reply },
    /// Unsolicited push.
    Event { notification: Notification },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_join_without_name_decodes() {
        let intent: Intent = serde_json::from_str(r#"{"type":"Join"}"#).unwrap();
        assert_eq!(intent, Intent::Join { name: None });
    }

    #[test]
    fn test_intent_leave_is_tag_only() {
        let json = serde_json::to_string(&Intent::Leave).unwrap();
        assert_eq!(json, r#"{"type":"Leave"}"#);
    }

    #[test]
    fn test_reply_rejected_wire_shape() {
        let reply = Reply::Rejected {
            kind: ErrorKind::Protocol,
            code: "not_your_turn".into(),
            message: "it is not your turn".into(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["type"], "Rejected");
        assert_eq!(value["kind"], "protocol");
        assert_eq!(value["code"], "not_your_turn");
    }

    #[test]
    fn test_server_frame_event_nests_notification() {
        let frame = ServerFrame::Event {
            notification: Notification::TurnChanged {
                turn: ParticipantId(2),
            },
        };
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "Event");
        assert_eq!(value["notification"]["type"], "TurnChanged");
        assert_eq!(value["notification"]["turn"], 2);
    }

    #[test]
    fn test_snapshot_participant_view_has_no_secret_field() {
        let view = ParticipantView {
            id: ParticipantId(1),
            name: "Ada".into(),
            ready: true,
        };
        let value = serde_json::to_value(&view).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 3);
        assert!(!keys.contains(&"secret"));
    }

    #[test]
    fn test_scored_reply_uses_total_value_matches() {
        let reply = Reply::Scored {
            feedback: Feedback {
                positional_matches: 2,
                value_matches: 4,
            },
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["feedback"]["positional_matches"], 2);
        assert_eq!(value["feedback"]["value_matches"], 4);
    }
}
