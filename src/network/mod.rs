//! Network Layer
//!
//! TCP server, session registry, wire protocol and client.
//! This layer is **concurrent** - all game rules live in `game/`.

pub mod client;
pub mod protocol;
pub mod session;
pub mod server;

pub use client::{ClientError, GameClient};
pub use protocol::{ProtocolError, Request, MAX_FRAME_LEN};
pub use session::{Binding, SessionEntry, SessionRegistry};
pub use server::{GameServer, GameServerError, ServerConfig};
