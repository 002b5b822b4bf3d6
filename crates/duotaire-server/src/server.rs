//! `DuotaireServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry/matchmaking →
//! room engine. Each accepted connection gets its own handler task; the
//! registry sweep runs as a background task owned by the server.

use std::sync::Arc;
use std::time::Instant;

use duotaire_protocol::JsonCodec;
use duotaire_room::{
    spawn_sweeper, Matchmaker, RoomConfig, RoomRegistry,
};
use duotaire_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::{handle_connection, MatchContext};
use crate::ServerError;

/// Shared server state, one per process, cloned into handler tasks.
///
/// Both shared structures follow the same discipline: a single mutex,
/// O(1) critical sections, and the lock is never held across a call into
/// a room actor.
pub(crate) struct ServerState {
    pub(crate) registry: Arc<Mutex<RoomRegistry>>,
    pub(crate) matchmaker: Mutex<Matchmaker<MatchContext>>,
    pub(crate) codec: JsonCodec,
    pub(crate) started_at: Instant,
}

impl ServerState {
    pub(crate) fn new(config: RoomConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(RoomRegistry::new(config))),
            matchmaker: Mutex::new(Matchmaker::new()),
            codec: JsonCodec,
            started_at: Instant::now(),
        }
    }
}

/// Builder for configuring and starting a Duo-taire server.
///
/// # Example
///
/// ```rust,ignore
/// let server = DuotaireServer::builder()
///     .bind("0.0.0.0:2567")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DuotaireServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl DuotaireServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:2567".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address the game transport binds to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the room configuration (zap window, sweep cadence, seed).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the transport and assembles the server.
    pub async fn build(self) -> Result<DuotaireServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState::new(self.room_config));
        Ok(DuotaireServer { transport, state })
    }
}

impl Default for DuotaireServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Duo-taire game server.
pub struct DuotaireServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl DuotaireServer {
    pub fn builder() -> DuotaireServerBuilder {
        DuotaireServerBuilder::new()
    }

    /// The bound game-transport address.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The HTTP observability router (`/` and `/health`), to be served on
    /// a separate listener.
    pub fn http_router(&self) -> axum::Router {
        crate::http::router(Arc::clone(&self.state))
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Spawns the registry sweep, then accepts connections forever; each
    /// one gets its own handler task.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let _sweeper = spawn_sweeper(Arc::clone(&self.state.registry));
        tracing::info!("Duo-taire server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
