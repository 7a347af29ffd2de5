//! The per-session state machine.
//!
//! A [`Session`] owns its two seats, the committed secrets, the turn, and
//! the transcript. Every transition method validates first and mutates
//! second, so a rejected call leaves the session exactly as it was.
//! Notifications produced by a transition are appended to an outbox
//! (`&mut Vec<Delivery>`) already addressed to concrete participants.

use codebreak_protocol::{
    Feedback, Notification, ParticipantId, ParticipantView, SessionId,
    SessionSnapshot,
};
use rand::Rng;

use crate::{
    Code, Ending, RegistryConfig, Seat, SessionError, SessionState, Transcript,
    score,
};

/// A notification addressed to one participant.
pub type Delivery = (ParticipantId, Notification);

/// A seated participant.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    secret: Option<Code>,
}

impl Participant {
    fn new(id: ParticipantId, name: String) -> Self {
        Self {
            id,
            name,
            secret: None,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once a secret has been committed.
    pub fn is_ready(&self) -> bool {
        self.secret.is_some()
    }

    fn view(&self) -> ParticipantView {
        ParticipantView {
            id: self.id,
            name: self.name.clone(),
            ready: self.is_ready(),
        }
    }
}

/// One two-participant game.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    seats: [Option<Participant>; 2],
    state: SessionState,
    transcript: Transcript,
    snapshot_tail: usize,
}

impl Session {
    /// Creates an empty, open session.
    pub fn new(id: SessionId, config: &RegistryConfig) -> Self {
        Self {
            id,
            seats: [None, None],
            state: SessionState::Open,
            transcript: Transcript::new(config.transcript_capacity),
            snapshot_tail: config.snapshot_tail,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Number of occupied seats.
    pub fn participant_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.participant_count() == 0
    }

    /// The seat `participant_id` occupies, if any.
    pub fn seat_of(&self, participant_id: ParticipantId) -> Option<Seat> {
        Seat::BOTH
            .into_iter()
            .find(|seat| self.occupant(*seat).is_some_and(|p| p.id == participant_id))
    }

    pub fn contains(&self, participant_id: ParticipantId) -> bool {
        self.seat_of(participant_id).is_some()
    }

    /// The participant in `seat`, if occupied.
    pub fn occupant(&self, seat: Seat) -> Option<&Participant> {
        self.seats[seat.index()].as_ref()
    }

    /// Seated participants in seat order.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.seats.iter().flatten()
    }

    /// The participant allowed to guess right now.
    pub fn turn_holder(&self) -> Option<ParticipantId> {
        self.state
            .turn()
            .and_then(|seat| self.occupant(seat))
            .map(Participant::id)
    }

    /// The winner, once someone has cracked the opponent's code.
    pub fn winner(&self) -> Option<ParticipantId> {
        match self.state {
            SessionState::Terminated(Ending::Won { winner }) => Some(winner),
            _ => None,
        }
    }

    /// Sanitized view for clients. Secrets are never included.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            phase: self.state.phase(),
            participants: self.participants().map(Participant::view).collect(),
            turn: self.turn_holder(),
            transcript: self.transcript.tail(self.snapshot_tail),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Seats a participant.
    ///
    /// The first joiner is told to wait; the second fills the session,
    /// moves it to `Committing`, and both are told they are paired.
    pub fn join(
        &mut self,
        participant_id: ParticipantId,
        name: String,
        out: &mut Vec<Delivery>,
    ) -> Result<Seat, SessionError> {
        if self.contains(participant_id) {
            return Err(SessionError::AlreadyInSession(
                participant_id,
                self.id.clone(),
            ));
        }
        if !self.state.is_joinable() {
            return Err(SessionError::SessionFull(self.id.clone()));
        }
        let seat = Seat::BOTH
            .into_iter()
            .find(|seat| self.occupant(*seat).is_none())
            .ok_or_else(|| SessionError::SessionFull(self.id.clone()))?;

        self.transcript.record(format!("{name} joined."));
        self.seats[seat.index()] = Some(Participant::new(participant_id, name));
        tracing::info!(
            session_id = %self.id,
            %participant_id,
            participants = self.participant_count(),
            "participant joined"
        );

        if self.participant_count() == 2 {
            self.state = SessionState::Committing;
            self.transcript.record("Both players are here. Choose your secrets.");
            for seat in Seat::BOTH {
                if let (Some(me), Some(opponent)) =
                    (self.occupant(seat), self.occupant(seat.other()))
                {
                    out.push((
                        me.id,
                        Notification::Paired {
                            session_id: self.id.clone(),
                            opponent: opponent.view(),
                        },
                    ));
                }
            }
        } else {
            out.push((
                participant_id,
                Notification::Waiting {
                    session_id: self.id.clone(),
                },
            ));
        }

        self.broadcast_snapshot(out);
        Ok(seat)
    }

    /// Commits a participant's secret.
    ///
    /// The second commit starts the game; the starting seat is drawn from
    /// `rng` with equal probability.
    pub fn commit_secret<R: Rng>(
        &mut self,
        participant_id: ParticipantId,
        raw: &str,
        rng: &mut R,
        out: &mut Vec<Delivery>,
    ) -> Result<(), SessionError> {
        let seat = self
            .seat_of(participant_id)
            .ok_or(SessionError::NotInSession(participant_id))?;
        match self.state {
            SessionState::Committing => {}
            SessionState::Open => return Err(SessionError::WaitingForOpponent),
            SessionState::InProgress { .. } => {
                return Err(SessionError::AlreadyCommitted);
            }
            SessionState::Terminated(_) => return Err(SessionError::GameOver),
        }

        let participant = self.seats[seat.index()]
            .as_mut()
            .ok_or(SessionError::NotInSession(participant_id))?;
        if participant.is_ready() {
            return Err(SessionError::AlreadyCommitted);
        }
        let code = Code::parse(raw)?;
        participant.secret = Some(code);
        let name = participant.name.clone();

        self.transcript.record(format!("{name} is ready."));
        tracing::debug!(session_id = %self.id, %participant_id, "secret committed");
        self.notify_all(
            out,
            Notification::SecretCommitted {
                participant_id,
                name,
            },
        );

        if self.participants().filter(|p| p.is_ready()).count() == 2 {
            let starting = if rng.random::<bool>() {
                Seat::First
            } else {
                Seat::Second
            };
            self.state = SessionState::InProgress { turn: starting };

            if let Some(starter) = self.occupant(starting) {
                let (starter_id, starter_name) = (starter.id, starter.name.clone());
                self.transcript
                    .record(format!("Game started. {starter_name} starts."));
                tracing::info!(
                    session_id = %self.id,
                    starting = %starter_id,
                    "game started"
                );
                self.notify_all(
                    out,
                    Notification::GameStarted {
                        starting: starter_id,
                        name: starter_name,
                    },
                );
            }
        }

        self.broadcast_snapshot(out);
        Ok(())
    }

    /// Scores the turn holder's guess against the opponent's secret.
    ///
    /// A full positional match ends the session with the guesser as
    /// winner; anything else passes the turn to the opponent.
    pub fn guess(
        &mut self,
        participant_id: ParticipantId,
        raw: &str,
        out: &mut Vec<Delivery>,
    ) -> Result<Feedback, SessionError> {
        let seat = self
            .seat_of(participant_id)
            .ok_or(SessionError::NotInSession(participant_id))?;
        let turn = match self.state {
            SessionState::InProgress { turn } => turn,
            SessionState::Open | SessionState::Committing => {
                return Err(SessionError::GameNotStarted);
            }
            SessionState::Terminated(_) => return Err(SessionError::GameOver),
        };
        if seat != turn {
            return Err(SessionError::NotYourTurn);
        }
        let guess = Code::parse(raw)?;

        let opponent = self.occupant(seat.other()).map(|p| (p.id, p.secret));
        let (opponent_id, secret) = match opponent {
            Some((id, Some(secret))) => (id, secret),
            _ => {
                self.abort("opponent secret missing during a running game", out);
                return Err(SessionError::OpponentSecretMissing);
            }
        };

        let feedback = score(&secret, &guess);
        let name = self
            .occupant(seat)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let guess = guess.to_string();

        self.transcript
            .record(format!("{name} guessed {guess}: {feedback}."));
        out.push((
            participant_id,
            Notification::YourGuess {
                guess: guess.clone(),
                feedback,
            },
        ));
        out.push((
            opponent_id,
            Notification::OpponentGuessed {
                by: participant_id,
                name: name.clone(),
                guess,
                feedback,
            },
        ));

        if feedback.is_solved() {
            self.state = SessionState::Terminated(Ending::Won {
                winner: participant_id,
            });
            self.transcript.record(format!("{name} won!"));
            tracing::info!(session_id = %self.id, winner = %participant_id, "game won");
            self.notify_all(
                out,
                Notification::GameWon {
                    winner: participant_id,
                    name,
                },
            );
        } else {
            self.state = SessionState::InProgress { turn: seat.other() };
            self.notify_all(out, Notification::TurnChanged { turn: opponent_id });
        }

        self.broadcast_snapshot(out);
        Ok(feedback)
    }

    /// Removes a participant. Returns `false` if they were not seated.
    ///
    /// Leaving an `Open` session keeps it open. Leaving once paired ends
    /// the session, and whoever remains is told their opponent left.
    pub fn depart(
        &mut self,
        participant_id: ParticipantId,
        out: &mut Vec<Delivery>,
    ) -> bool {
        let Some(seat) = self.seat_of(participant_id) else {
            return false;
        };
        let Some(leaver) = self.seats[seat.index()].take() else {
            return false;
        };

        self.transcript.record(format!("{} left.", leaver.name));
        tracing::info!(
            session_id = %self.id,
            %participant_id,
            state = %self.state,
            "participant left"
        );

        match self.state {
            SessionState::Committing | SessionState::InProgress { .. } => {
                self.state = SessionState::Terminated(Ending::Abandoned {
                    by: participant_id,
                });
                if let Some(remaining) = self.occupant(seat.other()) {
                    out.push((
                        remaining.id,
                        Notification::OpponentLeft {
                            participant_id,
                            name: leaver.name,
                        },
                    ));
                }
            }
            SessionState::Open | SessionState::Terminated(_) => {}
        }

        self.broadcast_snapshot(out);
        true
    }

    /// Closes the session after an internal invariant breach.
    fn abort(&mut self, reason: &str, out: &mut Vec<Delivery>) {
        tracing::error!(
            session_id = %self.id,
            state = %self.state,
            reason,
            "session invariant violated, closing session"
        );
        self.state = SessionState::Terminated(Ending::Aborted);
        self.transcript.record(format!("Session closed: {reason}."));
        self.notify_all(
            out,
            Notification::SessionClosed {
                reason: reason.to_owned(),
            },
        );
        self.broadcast_snapshot(out);
    }

    // -----------------------------------------------------------------------
    // Outbox helpers
    // -----------------------------------------------------------------------

    fn notify_all(&self, out: &mut Vec<Delivery>, notification: Notification) {
        for p in self.participants() {
            out.push((p.id, notification.clone()));
        }
    }

    fn broadcast_snapshot(&self, out: &mut Vec<Delivery>) {
        let snapshot = self.snapshot();
        self.notify_all(out, Notification::SessionUpdate { snapshot });
    }
}
