//! # RPS Duel Server
//!
//! Session coordinator for two-player rock-paper-scissors over TCP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RPS DUEL SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Pure rules and state                      │
//! │  ├── moves.rs    - Rock / paper / scissors                   │
//! │  ├── resolver.rs - Move pair to outcome                      │
//! │  └── session.rs  - Per-match state, player slots             │
//! │                                                              │
//! │  network/        - Networking (concurrent)                   │
//! │  ├── server.rs   - Listener and connection handlers          │
//! │  ├── session.rs  - Session registry and pairing              │
//! │  ├── protocol.rs - Framing and request parsing               │
//! │  └── client.rs   - Protocol client                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Listener accepts a socket, the registry binds it to `(session, slot)`,
//! and a handler task loops: read request, mutate or query the session under
//! its lock, send back the whole session as the snapshot. When either
//! connection of a pair ends, the session is removed and the other handler
//! closes too.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::{resolve, Move, Outcome, PlayerSlot, Session, SessionId};
pub use network::{GameClient, GameServer, Request, ServerConfig, SessionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 5555;
