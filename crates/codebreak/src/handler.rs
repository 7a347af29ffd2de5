//! Per-connection handler: welcome, request routing, and notification push.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound channel with the registry → send Welcome
//!   2. Loop: `select!` between inbound frames and pushed notifications
//!   3. On close or error: leave the session and unregister the channel

use std::sync::Arc;

use codebreak_protocol::{
    ClientFrame, Codec, ErrorKind, Intent, Notification, PROTOCOL_VERSION,
    ParticipantId, Reply, ServerFrame,
};
use codebreak_session::{RegistryHandle, SessionError};
use codebreak_transport::{Connection, TransportError};
use tokio::sync::mpsc;

use crate::CodebreakError;
use crate::server::ServerState;

/// Drop guard that disconnects a participant when the handler exits.
///
/// The normal path awaits [`release`](Self::release). If the handler
/// panics instead, `Drop` spawns the disconnect as a fire-and-forget task.
struct ParticipantGuard {
    participant_id: ParticipantId,
    registry: RegistryHandle,
    armed: bool,
}

impl ParticipantGuard {
    fn new(participant_id: ParticipantId, registry: RegistryHandle) -> Self {
        Self {
            participant_id,
            registry,
            armed: true,
        }
    }

    async fn release(mut self) {
        self.armed = false;
        if let Err(e) = self.registry.disconnect(self.participant_id).await {
            tracing::debug!(
                participant_id = %self.participant_id,
                error = %e,
                "disconnect failed"
            );
        }
    }
}

impl Drop for ParticipantGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let participant_id = self.participant_id;
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let _ = registry.disconnect(participant_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
///
/// The connection id doubles as the participant id, so identity lasts
/// exactly as long as the connection.
pub(crate) async fn handle_connection<T, C>(
    conn: T,
    state: Arc<ServerState<C>>,
) -> Result<(), CodebreakError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    let conn_id = conn.id();
    let participant_id = ParticipantId(conn_id.into_inner());

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.registry.connect(participant_id, tx).await?;
    let guard = ParticipantGuard::new(participant_id, state.registry.clone());
    tracing::info!(%conn_id, %participant_id, "participant connected");

    let result = async {
        let welcome = ServerFrame::Welcome {
            participant_id,
            protocol_version: PROTOCOL_VERSION,
        };
        send_frame(&conn, &state.codec, &welcome).await?;
        serve(&conn, &state, participant_id, &mut rx).await
    }
    .await;

    guard.release().await;
    let _ = conn.close().await;
    tracing::info!(%conn_id, %participant_id, "participant disconnected");
    result
}

/// The message loop. Returns `Ok(())` on a clean close.
async fn serve<T, C>(
    conn: &T,
    state: &ServerState<C>,
    participant_id: ParticipantId,
    rx: &mut mpsc::UnboundedReceiver<Notification>,
) -> Result<(), CodebreakError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%participant_id, "connection closed cleanly");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!(%participant_id, error = %e, "recv error");
                        return Err(e.into());
                    }
                };
                let reply = handle_frame(state, participant_id, &data).await;
                send_frame(conn, &state.codec, &reply).await?;
            }
            Some(notification) = rx.recv() => {
                send_frame(conn, &state.codec, &ServerFrame::Event { notification }).await?;
            }
        }
    }
}

/// Decodes one client frame and produces the reply for it.
async fn handle_frame<C: Codec>(
    state: &ServerState<C>,
    participant_id: ParticipantId,
    data: &[u8],
) -> ServerFrame {
    let frame: ClientFrame = match state.codec.decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(%participant_id, error = %e, "failed to decode frame");
            return ServerFrame::Reply {
                request_id: 0,
                reply: Reply::Rejected {
                    kind: ErrorKind::Validation,
                    code: "malformed_frame".into(),
                    message: e.to_string(),
                },
            };
        }
    };

    let request_id = frame.request_id;
    let reply = match dispatch(&state.registry, participant_id, frame.intent).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::debug!(
                %participant_id,
                request_id,
                code = e.code(),
                "request rejected"
            );
            rejected(&e)
        }
    };
    ServerFrame::Reply { request_id, reply }
}

/// Routes an intent to the registry actor.
async fn dispatch(
    registry: &RegistryHandle,
    participant_id: ParticipantId,
    intent: Intent,
) -> Result<Reply, SessionError> {
    let reply = match intent {
        Intent::Join { name } => Reply::Joined {
            session_id: registry.admit(participant_id, name).await?,
        },
        Intent::CreateSession { name } => Reply::Joined {
            session_id: registry.create(participant_id, name).await?,
        },
        Intent::JoinSession { session_id, name } => {
            registry
                .join(participant_id, name, session_id.clone())
                .await?;
            Reply::Joined { session_id }
        }
        Intent::CommitSecret { code } => {
            registry.commit_secret(participant_id, code).await?;
            Reply::Committed
        }
        Intent::Guess { code } => Reply::Scored {
            feedback: registry.guess(participant_id, code).await?,
        },
        Intent::Leave => {
            registry.leave(participant_id).await?;
            Reply::Left
        }
    };
    Ok(reply)
}

fn rejected(err: &SessionError) -> Reply {
    Reply::Rejected {
        kind: err.kind(),
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

async fn send_frame<T, C>(
    conn: &T,
    codec: &C,
    frame: &ServerFrame,
) -> Result<(), CodebreakError>
where
    T: Connection<Error = TransportError>,
    C: Codec,
{
    let bytes = codec.encode(frame)?;
    conn.send(&bytes).await?;
    Ok(())
}
