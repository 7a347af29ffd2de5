//! `CodebreakServer` builder and accept loop.

use std::sync::Arc;

use codebreak_protocol::{Codec, JsonCodec};
use codebreak_session::{
    RegistryConfig, RegistryHandle, SessionRegistry, spawn_registry,
};
use codebreak_transport::{Transport, WebSocketTransport};

use crate::CodebreakError;
use crate::handler::handle_connection;

/// Address used when [`CodebreakServerBuilder::bind`] is not called.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4000";

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RegistryHandle,
    pub(crate) codec: C,
}

impl<C: Codec> ServerState<C> {
    pub(crate) fn new(registry: RegistryHandle, codec: C) -> Arc<Self> {
        Arc::new(Self { registry, codec })
    }
}

/// Builder for configuring and starting a Codebreak server.
///
/// ```rust,ignore
/// let server = CodebreakServer::builder()
///     .bind("0.0.0.0:4000")
///     .registry_config(RegistryConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct CodebreakServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
}

impl CodebreakServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            registry_config: RegistryConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the limits applied to every session.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Binds the listener and starts the registry actor.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<CodebreakServer, CodebreakError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let registry = spawn_registry(SessionRegistry::new(self.registry_config));

        Ok(CodebreakServer {
            transport,
            state: ServerState::new(registry, JsonCodec),
        })
    }
}

impl Default for CodebreakServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Codebreak server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct CodebreakServer {
    transport: WebSocketTransport,
    state: Arc<ServerState<JsonCodec>>,
}

impl CodebreakServer {
    /// Creates a new builder.
    pub fn builder() -> CodebreakServerBuilder {
        CodebreakServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the registry actor, e.g. for inspecting live sessions.
    pub fn registry(&self) -> RegistryHandle {
        self.state.registry.clone()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each connection. A failed accept (for
    /// example a bad WebSocket upgrade) is logged and the loop continues.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), CodebreakError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Codebreak server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
