//! Protocol Client
//!
//! Connects to a game server, reads the assigned slot from the handshake,
//! and exchanges requests for session snapshots. Holds no game logic of its
//! own: callers query the returned [`Session`] directly.

use std::fmt;
use std::io;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::game::moves::Move;
use crate::game::session::{PlayerSlot, Session};
use crate::network::protocol::{
    decode_handshake, decode_snapshot, read_frame, write_frame, ProtocolError, Request,
    MAX_FRAME_LEN,
};

/// Client-side failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Could not reach the server.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// Target address.
        addr: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Framing or decoding failed.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Server closed the stream (session torn down or server gone).
    #[error("Server closed the connection")]
    ConnectionClosed,

    /// Server sent a frame nobody asked for.
    #[error("Unexpected frame from server")]
    UnexpectedFrame,
}

/// A connected player.
pub struct GameClient {
    stream: TcpStream,
    slot: PlayerSlot,
}

impl GameClient {
    /// Connect and complete the handshake.
    pub async fn connect<A>(addr: A) -> Result<Self, ClientError>
    where
        A: ToSocketAddrs + fmt::Display,
    {
        let label = addr.to_string();
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect { addr: label, source })?;

        let payload = read_frame(&mut stream, MAX_FRAME_LEN)
            .await?
            .ok_or(ClientError::ConnectionClosed)?;
        let slot = decode_handshake(&payload)?;

        Ok(Self { stream, slot })
    }

    /// Slot assigned by the server.
    pub fn slot(&self) -> PlayerSlot {
        self.slot
    }

    /// Send a request and wait for the snapshot.
    pub async fn send(&mut self, request: Request) -> Result<Session, ClientError> {
        self.send_raw(request.as_wire().as_bytes()).await
    }

    /// Send an arbitrary payload and wait for the snapshot.
    pub async fn send_raw(&mut self, payload: &[u8]) -> Result<Session, ClientError> {
        write_frame(&mut self.stream, payload, MAX_FRAME_LEN).await?;
        let response = read_frame(&mut self.stream, MAX_FRAME_LEN)
            .await?
            .ok_or(ClientError::ConnectionClosed)?;
        Ok(decode_snapshot(&response)?)
    }

    /// Query the session.
    pub async fn get(&mut self) -> Result<Session, ClientError> {
        self.send(Request::Get).await
    }

    /// Submit a move for this slot.
    pub async fn play(&mut self, mv: Move) -> Result<Session, ClientError> {
        self.send(Request::Play(mv)).await
    }

    /// Clear the round's submission flags.
    pub async fn reset(&mut self) -> Result<Session, ClientError> {
        self.send(Request::Reset).await
    }

    /// Wait for the server to close this connection.
    ///
    /// Returns `Ok(())` on a clean close; a frame arriving instead is a
    /// protocol violation since the server never pushes unsolicited data.
    pub async fn closed(&mut self) -> Result<(), ClientError> {
        match read_frame(&mut self.stream, MAX_FRAME_LEN).await {
            Ok(None) => Ok(()),
            Ok(Some(_)) => Err(ClientError::UnexpectedFrame),
            Err(ProtocolError::Io(e)) if e.kind() == io::ErrorKind::ConnectionReset => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
