//! Game Logic Module
//!
//! Pure, synchronous rules and state. No I/O, no logging.
//!
//! ## Module Structure
//!
//! - `moves`: The three hands and their parse rules
//! - `resolver`: Move pair to round outcome
//! - `session`: Per-match state and player slots

pub mod moves;
pub mod resolver;
pub mod session;

// Re-export key types
pub use moves::{Move, ParseMoveError};
pub use resolver::{resolve, Outcome};
pub use session::{PlayerSlot, Session, SessionId, SlotError};
