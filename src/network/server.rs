//! TCP Game Server
//!
//! Async listener plus one connection handler task per accepted socket.
//! The listener pairs arrivals into sessions through the [`SessionRegistry`];
//! each handler then runs the request/response loop for its slot.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::game::resolver::Outcome;
use crate::game::session::{PlayerSlot, Session};
use crate::network::protocol::{
    encode_handshake, encode_snapshot, read_frame, write_frame, ProtocolError, Request,
    MAX_FRAME_LEN,
};
use crate::network::session::{Binding, SessionRegistry};
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host name or address to bind.
    pub host: String,
    /// TCP port to bind (0 picks a free port).
    pub port: u16,
    /// Close a connection after this long without a request.
    pub idle_timeout: Option<Duration>,
    /// Frame size limit in both directions.
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: Some(Duration::from_secs(300)),
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    /// `host:port` string used for binding and logs.
    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        /// Requested bind target.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Socket error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Framing or decoding error.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

// =============================================================================
// LISTENER
// =============================================================================

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Bound listening socket.
    listener: TcpListener,
    /// Session registry shared with every handler.
    registry: Arc<SessionRegistry>,
    /// Shutdown signal.
    shutdown_tx: watch::Sender<bool>,
}

impl GameServer {
    /// Bind the listening socket.
    ///
    /// A bind failure is fatal for the process; the caller decides how to exit.
    pub async fn bind(config: ServerConfig) -> Result<Self, GameServerError> {
        let target = config.bind_target();
        let listener = TcpListener::bind(target.as_str())
            .await
            .map_err(|source| GameServerError::BindFailed { addr: target, source })?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            listener,
            registry: Arc::new(SessionRegistry::new()),
            shutdown_tx,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, GameServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop until [`GameServer::shutdown`] is called.
    ///
    /// Accept errors are logged and the loop keeps going.
    #[instrument(skip(self), fields(addr = %self.config.bind_target()))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        info!("Game server listening on {}", self.local_addr()?);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.handle_connection(stream, peer).await,
                        Err(e) => error!("Accept error: {}", e),
                    }
                }
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Bind a fresh connection to a session slot and spawn its handler.
    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let binding = self.registry.join().await;
        match binding.slot {
            PlayerSlot::One => info!(
                "Connected to {}: created session {}, waiting for opponent",
                peer, binding.session_id
            ),
            PlayerSlot::Two => info!(
                "Connected to {}: joined session {}, session ready",
                peer, binding.session_id
            ),
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY for {}: {}", peer, e);
        }

        let handler = ConnectionHandler {
            stream,
            peer,
            binding,
            registry: self.registry.clone(),
            idle_timeout: self.config.idle_timeout,
            max_frame_len: self.config.max_frame_len,
            shutdown_rx: self.shutdown_tx.subscribe(),
        };
        tokio::spawn(handler.run());
    }

    /// Stop the accept loop and every connection handler.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Shared session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }

    /// Connections accepted since startup.
    pub async fn connection_count(&self) -> u64 {
        self.registry.connection_count().await
    }
}

// =============================================================================
// CONNECTION HANDLER
// =============================================================================

/// Why a handler left its loop without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    PeerClosed,
    SessionGone,
    IdleTimeout,
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloseReason::PeerClosed => "peer closed",
            CloseReason::SessionGone => "session removed",
            CloseReason::IdleTimeout => "idle timeout",
            CloseReason::Shutdown => "server shutdown",
        })
    }
}

/// Request loop for one connection bound to one session slot.
struct ConnectionHandler {
    stream: TcpStream,
    peer: SocketAddr,
    binding: Binding,
    registry: Arc<SessionRegistry>,
    idle_timeout: Option<Duration>,
    max_frame_len: usize,
    shutdown_rx: watch::Receiver<bool>,
}

impl ConnectionHandler {
    #[instrument(
        skip_all,
        fields(peer = %self.peer, session = self.binding.session_id, slot = %self.binding.slot)
    )]
    async fn run(mut self) {
        let session_id = self.binding.session_id;

        match self.serve().await {
            Ok(CloseReason::IdleTimeout) => warn!("Lost connection (idle timeout)"),
            Ok(reason) => info!("Lost connection ({})", reason),
            Err(e) => warn!("Lost connection: {}", e),
        }

        // The pair is torn down together; the peer's handler sees the signal.
        if self.registry.remove(session_id).await {
            info!("Closing session {}", session_id);
        }
    }

    async fn serve(&mut self) -> Result<CloseReason, GameServerError> {
        let session_id = self.binding.session_id;
        let slot = self.binding.slot;
        let max_len = self.max_frame_len;
        let (mut reader, mut writer) = self.stream.split();

        write_frame(&mut writer, &encode_handshake(slot), max_len).await?;

        loop {
            let read = with_idle_timeout(self.idle_timeout, read_frame(&mut reader, max_len));
            let frame = tokio::select! {
                result = read => match result {
                    Some(frame) => frame?,
                    None => return Ok(CloseReason::IdleTimeout),
                },
                _ = self.binding.teardown.recv() => return Ok(CloseReason::SessionGone),
                _ = wait_for_shutdown(&mut self.shutdown_rx) => return Ok(CloseReason::Shutdown),
            };

            let Some(frame) = frame else {
                return Ok(CloseReason::PeerClosed);
            };

            let request = match Request::from_frame(&frame) {
                Ok(request) => Some(request),
                // Rejected, not treated as a move; the reply is the unchanged snapshot.
                Err(ProtocolError::InvalidRequest(text)) => {
                    warn!("Ignoring invalid request {:?}", text);
                    None
                }
                Err(e) => return Err(e.into()),
            };

            let Some(entry) = self.registry.get(session_id).await else {
                return Ok(CloseReason::SessionGone);
            };

            let snapshot = {
                let mut session = entry.write().await;
                if let Some(request) = request {
                    debug!("Request {}", request);
                    if let Some(outcome) = apply_request(&mut session, slot, request) {
                        info!("Session {} round complete: {}", session_id, outcome);
                    }
                }
                session.clone()
            };

            write_frame(&mut writer, &encode_snapshot(&snapshot)?, max_len).await?;
        }
    }
}

/// Apply one request to the session on behalf of `slot`.
///
/// Returns the outcome tallied when a reset closes a completed round.
pub fn apply_request(session: &mut Session, slot: PlayerSlot, request: Request) -> Option<Outcome> {
    match request {
        Request::Get => None,
        Request::Reset => session.reset_round(),
        Request::Play(mv) => {
            session.record_move(slot, mv);
            None
        }
    }
}

/// Resolves once the shutdown flag is set or the server is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|&stop| stop).await;
}

/// `None` when the limit elapses first.
async fn with_idle_timeout<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
