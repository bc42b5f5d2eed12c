//! Protocol Messages
//!
//! Wire format for client-server communication over a raw TCP stream.
//!
//! Every message is one frame: a 4-byte big-endian length followed by the
//! payload. The server speaks first with the handshake (the player slot as
//! text, `"0"` or `"1"`). After that the client sends one request frame and
//! the server answers with one snapshot frame (the JSON-encoded [`Session`]).

use std::fmt;
use std::io;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::game::moves::Move;
use crate::game::session::{PlayerSlot, Session};

/// Largest payload accepted in either direction.
pub const MAX_FRAME_LEN: usize = 4096;

// =============================================================================
// REQUESTS
// =============================================================================

/// A decoded client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Query the session without changing it.
    Get,
    /// Clear this round's submission flags.
    Reset,
    /// Submit the sender's move.
    Play(Move),
}

impl Request {
    /// Parse a request payload.
    ///
    /// Verbs and move names are matched case-insensitively after trimming.
    /// Anything else is an invalid request, never a silent no-op move. The
    /// rejection stays server-side: the handler logs it and answers with the
    /// unchanged snapshot, since no error payload exists on the wire.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("get") {
            Ok(Request::Get)
        } else if text.eq_ignore_ascii_case("reset") {
            Ok(Request::Reset)
        } else {
            text.parse::<Move>()
                .map(Request::Play)
                .map_err(|_| ProtocolError::InvalidRequest(text.to_string()))
        }
    }

    /// Decode a raw request frame. Non-UTF-8 bytes are a decode failure.
    pub fn from_frame(payload: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        Self::parse(text)
    }

    /// Text sent on the wire.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Request::Get => "get",
            Request::Reset => "reset",
            Request::Play(mv) => mv.as_str(),
        }
    }
}

impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Request::parse(s)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Protocol-level failures.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Underlying socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Frame length over the limit.
    #[error("Frame too large: {len} bytes (max {max})")]
    FrameTooLarge {
        /// Announced or attempted length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Stream ended inside a frame.
    #[error("Connection closed mid-frame")]
    TruncatedFrame,

    /// Request bytes are not UTF-8.
    #[error("Payload is not valid UTF-8")]
    InvalidUtf8,

    /// Text is neither a verb nor a move name.
    #[error("Invalid request: {0:?}")]
    InvalidRequest(String),

    /// Handshake payload is not a player slot.
    #[error("Invalid handshake: {0:?}")]
    InvalidHandshake(String),

    /// Snapshot (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// FRAMING
// =============================================================================

/// Write one length-prefixed frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8], max_len: usize) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let too_large = || ProtocolError::FrameTooLarge { len: payload.len(), max: max_len };
    if payload.len() > max_len {
        return Err(too_large());
    }
    let len = u32::try_from(payload.len()).map_err(|_| too_large())?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// Returns `Ok(None)` when the peer closes cleanly between frames.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(ProtocolError::TruncatedFrame)
            };
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_len {
        return Err(ProtocolError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ProtocolError::TruncatedFrame,
        _ => ProtocolError::Io(e),
    })?;
    Ok(Some(payload))
}

// =============================================================================
// PAYLOAD HELPERS
// =============================================================================

/// Handshake payload for an assigned slot.
pub fn encode_handshake(slot: PlayerSlot) -> Vec<u8> {
    slot.to_string().into_bytes()
}

/// Parse the handshake payload back into a slot.
pub fn decode_handshake(payload: &[u8]) -> Result<PlayerSlot, ProtocolError> {
    let text = String::from_utf8_lossy(payload).trim().to_string();
    match text.parse::<u64>().ok().map(PlayerSlot::try_from) {
        Some(Ok(slot)) => Ok(slot),
        _ => Err(ProtocolError::InvalidHandshake(text)),
    }
}

/// Serialize a session snapshot.
pub fn encode_snapshot(session: &Session) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(session)?)
}

/// Deserialize a session snapshot.
pub fn decode_snapshot(payload: &[u8]) -> Result<Session, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}
