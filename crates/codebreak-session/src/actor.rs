//! Registry actor: a single Tokio task that owns the [`SessionRegistry`].
//!
//! Connection handlers never touch the registry directly. They send
//! commands through a [`RegistryHandle`] and wait for the reply, so every
//! admission and every session transition is applied one at a time by the
//! owning task. Notifications produced along the way are pushed to each
//! participant's outbound channel before the reply is sent.

use std::collections::HashMap;

use codebreak_protocol::{
    Feedback, Notification, ParticipantId, SessionId, SessionSnapshot,
};
use tokio::sync::{mpsc, oneshot};

use crate::{Delivery, SessionError, SessionRegistry};

/// Channel sender for delivering notifications to a participant.
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Default command channel size for the registry actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

type Reply<T> = oneshot::Sender<T>;

/// Commands sent to the registry actor through its channel.
enum RegistryCommand {
    /// Register a participant's outbound channel.
    Connect {
        participant_id: ParticipantId,
        sender: NotificationSender,
    },

    /// Remove a participant from its session and drop its channel.
    Disconnect {
        participant_id: ParticipantId,
        reply: Reply<bool>,
    },

    Admit {
        participant_id: ParticipantId,
        name: Option<String>,
        reply: Reply<Result<SessionId, SessionError>>,
    },

    Create {
        participant_id: ParticipantId,
        name: Option<String>,
        reply: Reply<Result<SessionId, SessionError>>,
    },

    Join {
        participant_id: ParticipantId,
        name: Option<String>,
        session_id: SessionId,
        reply: Reply<Result<(), SessionError>>,
    },

    Commit {
        participant_id: ParticipantId,
        code: String,
        reply: Reply<Result<(), SessionError>>,
    },

    Guess {
        participant_id: ParticipantId,
        code: String,
        reply: Reply<Result<Feedback, SessionError>>,
    },

    /// Leave the current session but stay connected.
    Leave {
        participant_id: ParticipantId,
        reply: Reply<bool>,
    },

    Locate {
        participant_id: ParticipantId,
        reply: Reply<Option<SessionId>>,
    },

    Snapshot {
        session_id: SessionId,
        reply: Reply<Option<SessionSnapshot>>,
    },

    Info {
        reply: Reply<RegistryInfo>,
    },

    /// Stop the actor.
    Shutdown,
}

/// Registry-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryInfo {
    /// Live sessions.
    pub session_count: usize,
    /// Sessions waiting for a second participant.
    pub open_sessions: usize,
    /// Participants with a registered outbound channel.
    pub connected: usize,
}

/// Handle to the running registry actor.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. Every method fails with
/// [`SessionError::Unavailable`] once the actor has stopped.
#[derive(Clone)]
pub struct RegistryHandle {
    sender: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Registers the channel notifications for `participant_id` go to.
    pub async fn connect(
        &self,
        participant_id: ParticipantId,
        sender: NotificationSender,
    ) -> Result<(), SessionError> {
        self.sender
            .send(RegistryCommand::Connect {
                participant_id,
                sender,
            })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Removes the participant from any session and forgets its channel.
    /// Returns whether they were seated.
    pub async fn disconnect(
        &self,
        participant_id: ParticipantId,
    ) -> Result<bool, SessionError> {
        self.call(|reply| RegistryCommand::Disconnect {
            participant_id,
            reply,
        })
        .await
    }

    /// Matchmaking: pairs with the oldest waiting participant or opens a
    /// new session.
    pub async fn admit(
        &self,
        participant_id: ParticipantId,
        name: Option<String>,
    ) -> Result<SessionId, SessionError> {
        self.call(|reply| RegistryCommand::Admit {
            participant_id,
            name,
            reply,
        })
        .await?
    }

    /// Opens a private session joinable only by id.
    pub async fn create(
        &self,
        participant_id: ParticipantId,
        name: Option<String>,
    ) -> Result<SessionId, SessionError> {
        self.call(|reply| RegistryCommand::Create {
            participant_id,
            name,
            reply,
        })
        .await?
    }

    /// Joins a specific session by id.
    pub async fn join(
        &self,
        participant_id: ParticipantId,
        name: Option<String>,
        session_id: SessionId,
    ) -> Result<(), SessionError> {
        self.call(|reply| RegistryCommand::Join {
            participant_id,
            name,
            session_id,
            reply,
        })
        .await?
    }

    pub async fn commit_secret(
        &self,
        participant_id: ParticipantId,
        code: String,
    ) -> Result<(), SessionError> {
        self.call(|reply| RegistryCommand::Commit {
            participant_id,
            code,
            reply,
        })
        .await?
    }

    pub async fn guess(
        &self,
        participant_id: ParticipantId,
        code: String,
    ) -> Result<Feedback, SessionError> {
        self.call(|reply| RegistryCommand::Guess {
            participant_id,
            code,
            reply,
        })
        .await?
    }

    /// Leaves the current session. Returns whether the participant was
    /// seated.
    pub async fn leave(
        &self,
        participant_id: ParticipantId,
    ) -> Result<bool, SessionError> {
        self.call(|reply| RegistryCommand::Leave {
            participant_id,
            reply,
        })
        .await
    }

    pub async fn locate(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Option<SessionId>, SessionError> {
        self.call(|reply| RegistryCommand::Locate {
            participant_id,
            reply,
        })
        .await
    }

    pub async fn snapshot(
        &self,
        session_id: SessionId,
    ) -> Result<Option<SessionSnapshot>, SessionError> {
        self.call(|reply| RegistryCommand::Snapshot { session_id, reply })
            .await
    }

    pub async fn info(&self) -> Result<RegistryInfo, SessionError> {
        self.call(|reply| RegistryCommand::Info { reply }).await
    }

    /// Tells the actor to stop. Pending commands already queued are
    /// dropped.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(RegistryCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RegistryCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }
}

/// The actor state. Runs inside a Tokio task.
struct RegistryActor {
    registry: SessionRegistry,
    /// Per-participant outbound channels.
    senders: HashMap<ParticipantId, NotificationSender>,
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RegistryActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!("session registry started");

        while let Some(cmd) = self.receiver.recv().await {
            let mut out = Vec::new();
            match cmd {
                RegistryCommand::Connect {
                    participant_id,
                    sender,
                } => {
                    self.senders.insert(participant_id, sender);
                    tracing::debug!(%participant_id, "participant connected");
                }
                RegistryCommand::Disconnect {
                    participant_id,
                    reply,
                } => {
                    let seated = self.registry.remove(participant_id, &mut out);
                    self.senders.remove(&participant_id);
                    tracing::debug!(%participant_id, seated, "participant disconnected");
                    self.dispatch(out);
                    let _ = reply.send(seated);
                }
                RegistryCommand::Admit {
                    participant_id,
                    name,
                    reply,
                } => {
                    let result = self.registry.admit(participant_id, name, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(result);
                }
                RegistryCommand::Create {
                    participant_id,
                    name,
                    reply,
                } => {
                    let result = self.registry.create(participant_id, name, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(result);
                }
                RegistryCommand::Join {
                    participant_id,
                    name,
                    session_id,
                    reply,
                } => {
                    let result =
                        self.registry
                            .join(participant_id, name, &session_id, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(result);
                }
                RegistryCommand::Commit {
                    participant_id,
                    code,
                    reply,
                } => {
                    let result =
                        self.registry.commit_secret(participant_id, &code, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(result);
                }
                RegistryCommand::Guess {
                    participant_id,
                    code,
                    reply,
                } => {
                    let result = self.registry.guess(participant_id, &code, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(result);
                }
                RegistryCommand::Leave {
                    participant_id,
                    reply,
                } => {
                    let seated = self.registry.remove(participant_id, &mut out);
                    self.dispatch(out);
                    let _ = reply.send(seated);
                }
                RegistryCommand::Locate {
                    participant_id,
                    reply,
                } => {
                    let _ = reply.send(self.registry.locate(participant_id));
                }
                RegistryCommand::Snapshot { session_id, reply } => {
                    let _ = reply.send(self.registry.snapshot(&session_id));
                }
                RegistryCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RegistryCommand::Shutdown => {
                    tracing::info!("session registry shutting down");
                    break;
                }
            }
        }

        tracing::info!(
            sessions = self.registry.session_count(),
            "session registry stopped"
        );
    }

    /// Sends each delivery to its participant. Silently drops if the
    /// receiver is gone.
    fn dispatch(&self, deliveries: Vec<Delivery>) {
        for (participant_id, notification) in deliveries {
            if let Some(sender) = self.senders.get(&participant_id) {
                let _ = sender.send(notification);
            }
        }
    }

    fn info(&self) -> RegistryInfo {
        RegistryInfo {
            session_count: self.registry.session_count(),
            open_sessions: self.registry.open_sessions(),
            connected: self.senders.len(),
        }
    }
}

/// Moves `registry` into a new actor task and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_registry(registry: SessionRegistry) -> RegistryHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let actor = RegistryActor {
        registry,
        senders: HashMap::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    RegistryHandle { sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegistryConfig;

    fn spawn() -> RegistryHandle {
        spawn_registry(SessionRegistry::with_seed(RegistryConfig::default(), 7))
    }

    async fn connect(handle: &RegistryHandle, id: u64) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        handle.connect(ParticipantId(id), tx).await.unwrap();
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut all = Vec::new();
        while let Ok(n) = rx.try_recv() {
            all.push(n);
        }
        all
    }

    #[tokio::test]
    async fn test_admit_delivers_waiting_then_paired() {
        let handle = spawn();
        let mut rx1 = connect(&handle, 1).await;
        let mut rx2 = connect(&handle, 2).await;

        let a = handle.admit(ParticipantId(1), Some("Ada".into())).await.unwrap();
        let b = handle.admit(ParticipantId(2), Some("Bob".into())).await.unwrap();

        assert_eq!(a, b);
        let to_ada = drain(&mut rx1);
        assert!(matches!(to_ada[0], Notification::Waiting { .. }));
        assert!(to_ada.iter().any(|n| matches!(n, Notification::Paired { .. })));
        assert!(drain(&mut rx2).iter().any(|n| matches!(n, Notification::Paired { .. })));
    }

    #[tokio::test]
    async fn test_errors_pass_through_handle() {
        let handle = spawn();
        let _rx = connect(&handle, 1).await;

        let result = handle.guess(ParticipantId(1), "1234".into()).await;

        assert_eq!(result, Err(SessionError::NotInSession(ParticipantId(1))));
    }

    #[tokio::test]
    async fn test_disconnect_notifies_opponent_and_clears_channel() {
        let handle = spawn();
        let _rx1 = connect(&handle, 1).await;
        let mut rx2 = connect(&handle, 2).await;
        handle.admit(ParticipantId(1), None).await.unwrap();
        handle.admit(ParticipantId(2), None).await.unwrap();
        drain(&mut rx2);

        assert!(handle.disconnect(ParticipantId(1)).await.unwrap());

        let to_bob = drain(&mut rx2);
        assert!(to_bob.iter().any(|n| matches!(n, Notification::OpponentLeft { .. })));
        let info = handle.info().await.unwrap();
        assert_eq!(info.connected, 1);
        assert_eq!(info.session_count, 0);
        assert_eq!(handle.locate(ParticipantId(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_handle_after_shutdown_returns_unavailable() {
        let handle = spawn();
        handle.shutdown().await.unwrap();

        // The actor drops its receiver once the loop exits.
        let mut result = Ok(None);
        for _ in 0..100 {
            result = handle.locate(ParticipantId(1)).await;
            if result.is_err() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(result, Err(SessionError::Unavailable));
    }
}
