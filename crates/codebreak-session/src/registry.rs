//! Session registry: creates, tracks, and routes participants to sessions.

use std::collections::{HashMap, VecDeque};

use codebreak_protocol::{Feedback, ParticipantId, SessionId, SessionSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Delivery, RegistryConfig, Session, SessionError};

/// Characters used for session ids. Excludes `I`, `O`, `0` and `1`.
const ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a generated session id.
const ID_LENGTH: usize = 6;

/// Display name used when a participant supplies none.
const DEFAULT_NAME: &str = "Player";

/// Owns every live session and tracks which participant sits where.
///
/// A participant is in at most one session at a time. Terminated and
/// empty sessions are destroyed as soon as the operation that produced
/// them returns, so lookups never see a stale session.
///
/// All methods take `&mut self`; run the registry behind
/// [`spawn_registry`](crate::spawn_registry) to share it across tasks.
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,

    /// Maps each participant to the session they are seated in.
    participants: HashMap<ParticipantId, SessionId>,

    /// Sessions waiting for a second participant, oldest first.
    open_queue: VecDeque<SessionId>,

    config: RegistryConfig,
    rng: StdRng,
}

impl SessionRegistry {
    /// Creates an empty registry seeded from the operating system.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an empty registry with a deterministic random source.
    ///
    /// Useful in tests: the starting player and generated session ids
    /// are reproducible for a given seed.
    pub fn with_seed(config: RegistryConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RegistryConfig, rng: StdRng) -> Self {
        Self {
            sessions: HashMap::new(),
            participants: HashMap::new(),
            open_queue: VecDeque::new(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    /// Seats a participant in the oldest open session, or opens a new one.
    pub fn admit(
        &mut self,
        participant_id: ParticipantId,
        name: Option<String>,
        out: &mut Vec<Delivery>,
    ) -> Result<SessionId, SessionError> {
        self.ensure_unseated(participant_id)?;
        let name = self.normalize_name(name);

        while let Some(session_id) = self.open_queue.pop_front() {
            let Some(session) = self.sessions.get_mut(&session_id) else {
                continue;
            };
            if !session.state().is_joinable() {
                continue;
            }
            session.join(participant_id, name, out)?;
            self.participants.insert(participant_id, session_id.clone());
            return Ok(session_id);
        }

        let session_id = self.open_session(participant_id, name, out)?;
        self.open_queue.push_back(session_id.clone());
        Ok(session_id)
    }

    /// Opens a private session that only a [`join`](Self::join) by id can
    /// fill. It is never handed out by [`admit`](Self::admit).
    pub fn create(
        &mut self,
        participant_id: ParticipantId,
        name: Option<String>,
        out: &mut Vec<Delivery>,
    ) -> Result<SessionId, SessionError> {
        self.ensure_unseated(participant_id)?;
        let name = self.normalize_name(name);
        self.open_session(participant_id, name, out)
    }

    /// Seats a participant in a specific session.
    pub fn join(
        &mut self,
        participant_id: ParticipantId,
        name: Option<String>,
        session_id: &SessionId,
        out: &mut Vec<Delivery>,
    ) -> Result<(), SessionError> {
        self.ensure_unseated(participant_id)?;
        let name = self.normalize_name(name);
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.clone()))?;

        session.join(participant_id, name, out)?;
        self.participants.insert(participant_id, session_id.clone());
        self.open_queue.retain(|id| id != session_id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Commits a secret for the participant's current session.
    pub fn commit_secret(
        &mut self,
        participant_id: ParticipantId,
        code: &str,
        out: &mut Vec<Delivery>,
    ) -> Result<(), SessionError> {
        let session_id = self.session_of(participant_id)?;
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotInSession(participant_id))?;
        session.commit_secret(participant_id, code, &mut self.rng, out)
    }

    /// Scores a guess in the participant's current session.
    pub fn guess(
        &mut self,
        participant_id: ParticipantId,
        code: &str,
        out: &mut Vec<Delivery>,
    ) -> Result<Feedback, SessionError> {
        let session_id = self.session_of(participant_id)?;
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotInSession(participant_id))?;
        let result = session.guess(participant_id, code, out);
        self.reap(&session_id);
        result
    }

    /// Removes a participant from whatever session they are in.
    ///
    /// Idempotent: returns `false` if the participant was not seated.
    pub fn remove(
        &mut self,
        participant_id: ParticipantId,
        out: &mut Vec<Delivery>,
    ) -> bool {
        let Some(session_id) = self.participants.remove(&participant_id) else {
            return false;
        };
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.depart(participant_id, out);
        }
        self.reap(&session_id);
        true
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The session a participant is seated in, if any.
    pub fn locate(&self, participant_id: ParticipantId) -> Option<SessionId> {
        self.participants.get(&participant_id).cloned()
    }

    /// Sanitized snapshot of a session.
    pub fn snapshot(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        self.sessions.get(session_id).map(Session::snapshot)
    }

    pub fn session(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Returns the number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Lists all live session ids.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }

    /// Number of sessions waiting in the matchmaking queue.
    pub fn open_sessions(&self) -> usize {
        self.open_queue.len()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_unseated(&self, participant_id: ParticipantId) -> Result<(), SessionError> {
        match self.participants.get(&participant_id) {
            Some(current) => Err(SessionError::AlreadyInSession(
                participant_id,
                current.clone(),
            )),
            None => Ok(()),
        }
    }

    fn session_of(&self, participant_id: ParticipantId) -> Result<SessionId, SessionError> {
        self.participants
            .get(&participant_id)
            .cloned()
            .ok_or(SessionError::NotInSession(participant_id))
    }

    /// Creates a session with `participant_id` in the first seat.
    fn open_session(
        &mut self,
        participant_id: ParticipantId,
        name: String,
        out: &mut Vec<Delivery>,
    ) -> Result<SessionId, SessionError> {
        let session_id = self.fresh_id();
        let mut session = Session::new(session_id.clone(), &self.config);
        session.join(participant_id, name, out)?;
        self.sessions.insert(session_id.clone(), session);
        self.participants.insert(participant_id, session_id.clone());
        tracing::info!(%session_id, "session created");
        Ok(session_id)
    }

    /// Destroys the session if it has ended or emptied.
    fn reap(&mut self, session_id: &SessionId) {
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };
        if !session.state().is_terminated() && !session.is_empty() {
            return;
        }
        let state = session.state();
        let Some(session) = self.sessions.remove(session_id) else {
            return;
        };
        for participant in session.participants() {
            self.participants.remove(&participant.id());
        }
        self.open_queue.retain(|sid| sid != session_id);
        tracing::info!(%session_id, %state, "session destroyed");
    }

    fn fresh_id(&mut self) -> SessionId {
        loop {
            let id: String = (0..ID_LENGTH)
                .map(|_| {
                    let i = self.rng.random_range(0..ID_ALPHABET.len());
                    char::from(ID_ALPHABET[i])
                })
                .collect();
            let id = SessionId::from(id);
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    /// Trims and truncates, falling back to the default when nothing is left.
    fn normalize_name(&self, name: Option<String>) -> String {
        let trimmed = name.as_deref().map(str::trim).unwrap_or_default();
        let name: String = trimmed.chars().take(self.config.max_name_len).collect();
        if name.is_empty() {
            return DEFAULT_NAME.to_owned();
        }
        name
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use codebreak_protocol::Notification;

    use super::*;
    use crate::SessionState;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::with_seed(RegistryConfig::default(), 42)
    }

    #[test]
    fn test_admit_first_participant_creates_open_session() {
        let mut reg = registry();
        let mut out = Vec::new();

        let sid = reg.admit(pid(1), Some("Ada".into()), &mut out).unwrap();

        assert_eq!(reg.session_count(), 1);
        assert_eq!(reg.open_sessions(), 1);
        assert_eq!(reg.locate(pid(1)), Some(sid.clone()));
        assert_eq!(reg.session(&sid).unwrap().state(), SessionState::Open);
    }

    #[test]
    fn test_admit_second_participant_pairs_into_same_session() {
        let mut reg = registry();
        let mut out = Vec::new();
        let a = reg.admit(pid(1), None, &mut out).unwrap();

        let b = reg.admit(pid(2), None, &mut out).unwrap();

        assert_eq!(a, b);
        assert_eq!(reg.open_sessions(), 0);
        assert_eq!(reg.session(&a).unwrap().state(), SessionState::Committing);
    }

    #[test]
    fn test_admit_third_participant_opens_new_session() {
        let mut reg = registry();
        let mut out = Vec::new();
        let a = reg.admit(pid(1), None, &mut out).unwrap();
        reg.admit(pid(2), None, &mut out).unwrap();

        let c = reg.admit(pid(3), None, &mut out).unwrap();

        assert_ne!(a, c);
        assert_eq!(reg.session_count(), 2);
        assert_eq!(reg.session(&a).unwrap().participant_count(), 2);
    }

    #[test]
    fn test_admit_already_seated_rejected() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.admit(pid(1), None, &mut out).unwrap();

        let result = reg.admit(pid(1), None, &mut out);

        assert_eq!(result, Err(SessionError::AlreadyInSession(pid(1), sid)));
        assert_eq!(reg.session_count(), 1);
    }

    #[test]
    fn test_admit_skips_abandoned_open_session() {
        let mut reg = registry();
        let mut out = Vec::new();
        let first = reg.admit(pid(1), None, &mut out).unwrap();
        reg.remove(pid(1), &mut out);

        let second = reg.admit(pid(2), None, &mut out).unwrap();

        assert_ne!(first, second);
        assert!(reg.session(&first).is_none());
        assert_eq!(reg.session_count(), 1);
    }

    #[test]
    fn test_create_is_not_matched_by_admit() {
        let mut reg = registry();
        let mut out = Vec::new();
        let private = reg.create(pid(1), None, &mut out).unwrap();

        let public = reg.admit(pid(2), None, &mut out).unwrap();

        assert_ne!(private, public);
        assert_eq!(reg.session(&private).unwrap().participant_count(), 1);
    }

    #[test]
    fn test_join_by_id_pairs() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.create(pid(1), Some("Ada".into()), &mut out).unwrap();

        reg.join(pid(2), Some("Bob".into()), &sid, &mut out).unwrap();

        assert_eq!(reg.locate(pid(2)), Some(sid.clone()));
        assert!(out.iter().any(|(to, n)| *to == pid(1)
            && matches!(n, Notification::Paired { opponent, .. } if opponent.name == "Bob")));
    }

    #[test]
    fn test_join_unknown_session_returns_not_found() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = SessionId::from("ZZZZZZ");

        assert_eq!(
            reg.join(pid(1), None, &sid, &mut out),
            Err(SessionError::SessionNotFound(sid))
        );
        assert_eq!(reg.locate(pid(1)), None);
    }

    #[test]
    fn test_join_full_session_returns_session_full() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.create(pid(1), None, &mut out).unwrap();
        reg.join(pid(2), None, &sid, &mut out).unwrap();

        assert_eq!(
            reg.join(pid(3), None, &sid, &mut out),
            Err(SessionError::SessionFull(sid))
        );
        assert_eq!(reg.locate(pid(3)), None);
    }

    #[test]
    fn test_join_removes_session_from_open_queue() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.admit(pid(1), None, &mut out).unwrap();

        reg.join(pid(2), None, &sid, &mut out).unwrap();

        assert_eq!(reg.open_sessions(), 0);
        let other = reg.admit(pid(3), None, &mut out).unwrap();
        assert_ne!(other, sid);
    }

    #[test]
    fn test_commit_without_session_returns_not_in_session() {
        let mut reg = registry();
        let mut out = Vec::new();

        assert_eq!(
            reg.commit_secret(pid(1), "1234", &mut out),
            Err(SessionError::NotInSession(pid(1)))
        );
    }

    #[test]
    fn test_winning_guess_destroys_session() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.admit(pid(1), None, &mut out).unwrap();
        reg.admit(pid(2), None, &mut out).unwrap();
        reg.commit_secret(pid(1), "1111", &mut out).unwrap();
        reg.commit_secret(pid(2), "2222", &mut out).unwrap();
        let holder = reg.session(&sid).unwrap().turn_holder().unwrap();
        let target = if holder == pid(1) { "2222" } else { "1111" };

        let fb = reg.guess(holder, target, &mut out).unwrap();

        assert!(fb.is_solved());
        assert!(reg.session(&sid).is_none());
        assert_eq!(reg.locate(pid(1)), None);
        assert_eq!(reg.locate(pid(2)), None);
        assert!(out.iter().any(|(_, n)| matches!(n, Notification::GameWon { winner, .. } if *winner == holder)));
    }

    #[test]
    fn test_remove_mid_game_destroys_session_and_frees_opponent() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.admit(pid(1), None, &mut out).unwrap();
        reg.admit(pid(2), None, &mut out).unwrap();
        out.clear();

        assert!(reg.remove(pid(1), &mut out));

        assert!(reg.session(&sid).is_none());
        assert_eq!(reg.locate(pid(2)), None);
        let left = out
            .iter()
            .filter(|(to, n)| *to == pid(2) && matches!(n, Notification::OpponentLeft { .. }))
            .count();
        assert_eq!(left, 1);

        // The remaining participant can be matched again.
        reg.admit(pid(2), None, &mut out).unwrap();
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = registry();
        let mut out = Vec::new();
        reg.admit(pid(1), None, &mut out).unwrap();

        assert!(reg.remove(pid(1), &mut out));
        assert!(!reg.remove(pid(1), &mut out));
        assert!(!reg.remove(pid(99), &mut out));
        assert_eq!(reg.session_count(), 0);
    }

    #[test]
    fn test_session_ids_use_alphabet() {
        let mut reg = registry();
        let mut out = Vec::new();
        for i in 0..20 {
            reg.create(pid(i), None, &mut out).unwrap();
        }
        for sid in reg.session_ids() {
            assert_eq!(sid.as_str().len(), ID_LENGTH);
            assert!(sid.as_str().bytes().all(|b| ID_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_name_normalization() {
        let config = RegistryConfig {
            max_name_len: 5,
            ..RegistryConfig::default()
        };
        let reg = SessionRegistry::with_seed(config, 0);

        assert_eq!(reg.normalize_name(None), "Player");
        assert_eq!(reg.normalize_name(Some("   ".into())), "Player");
        assert_eq!(reg.normalize_name(Some("  Ada ".into())), "Ada");
        assert_eq!(reg.normalize_name(Some("Bartholomew".into())), "Barth");
        assert_eq!(reg.config().max_name_len, 5);
    }

    #[test]
    fn test_name_normalization_zero_length_falls_back_to_default() {
        let config = RegistryConfig {
            max_name_len: 0,
            ..RegistryConfig::default()
        };
        let mut reg = SessionRegistry::with_seed(config, 0);
        let mut out = Vec::new();

        assert_eq!(reg.normalize_name(Some("Ada".into())), "Player");
        let sid = reg.admit(pid(1), Some("Ada".into()), &mut out).unwrap();
        let snap = reg.snapshot(&sid).unwrap();
        assert_eq!(snap.participants[0].name, "Player");
    }

    #[test]
    fn test_remove_mid_game_keeps_other_sessions_indexed() {
        let mut reg = registry();
        let mut out = Vec::new();
        let first = reg.admit(pid(1), None, &mut out).unwrap();
        reg.admit(pid(2), None, &mut out).unwrap();
        let second = reg.admit(pid(3), None, &mut out).unwrap();
        reg.admit(pid(4), None, &mut out).unwrap();

        assert!(reg.remove(pid(1), &mut out));

        assert!(reg.session(&first).is_none());
        assert_eq!(reg.locate(pid(2)), None);
        assert_eq!(reg.locate(pid(3)), Some(second.clone()));
        assert_eq!(reg.locate(pid(4)), Some(second));
        assert_eq!(reg.session_count(), 1);
    }

    #[test]
    fn test_snapshot_hides_secrets() {
        let mut reg = registry();
        let mut out = Vec::new();
        let sid = reg.admit(pid(1), None, &mut out).unwrap();
        reg.admit(pid(2), None, &mut out).unwrap();
        reg.commit_secret(pid(1), "9876", &mut out).unwrap();

        let snap = reg.snapshot(&sid).unwrap();

        assert!(!format!("{:?}", snap.participants).contains("9876"));
        assert!(snap.transcript.iter().all(|e| !e.text.contains("9876")));
        assert!(snap.participants[0].ready);
        assert!(!snap.participants[1].ready);
    }
}
