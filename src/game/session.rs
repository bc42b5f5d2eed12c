//! Session State
//!
//! The mutable state of one two-player match. The same type is what the
//! server serializes after every request, so clients run the queries below
//! (`both_moved`, `resolve`, `get_move`) directly on the snapshot they receive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::moves::Move;
use crate::game::resolver::{resolve, Outcome};

/// Sequential session identifier, unique for the process lifetime.
pub type SessionId = u64;

// =============================================================================
// PLAYER SLOT
// =============================================================================

/// Which half of a session a connection represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PlayerSlot {
    /// Slot 0, the connection that opened the session.
    One = 0,
    /// Slot 1, the connection that completed the pair.
    Two = 1,
}

impl PlayerSlot {
    /// Array index for per-slot fields.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The opposing slot.
    pub const fn other(self) -> PlayerSlot {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Raw slot number outside `{0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid player slot: {0}")]
pub struct SlotError(pub u64);

impl TryFrom<u64> for PlayerSlot {
    type Error = SlotError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerSlot::One),
            1 => Ok(PlayerSlot::Two),
            other => Err(SlotError(other)),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One match between two player slots.
///
/// `moves` is not cleared between rounds; a slot's entry is simply
/// overwritten by its next `record_move`. `has_moved` is what tracks the
/// current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    ready: bool,
    moves: [Option<Move>; 2],
    has_moved: [bool; 2],
    wins: [u32; 2],
    ties: u32,
}

impl Session {
    /// Create an empty, not-yet-ready session.
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            ready: false,
            moves: [None, None],
            has_moved: [false, false],
            wins: [0, 0],
            ties: 0,
        }
    }

    /// Record a slot's move for the current round.
    ///
    /// Calling again before `reset_round` replaces the earlier move.
    pub fn record_move(&mut self, slot: PlayerSlot, mv: Move) {
        self.moves[slot.index()] = Some(mv);
        self.has_moved[slot.index()] = true;
    }

    /// Whether both slots have submitted this round.
    pub fn both_moved(&self) -> bool {
        self.has_moved[0] && self.has_moved[1]
    }

    /// Whether one slot has submitted this round.
    pub fn has_moved(&self, slot: PlayerSlot) -> bool {
        self.has_moved[slot.index()]
    }

    /// Last move recorded for a slot, `None` if it never moved.
    pub fn get_move(&self, slot: PlayerSlot) -> Option<Move> {
        self.moves[slot.index()]
    }

    /// Outcome of the current round, `None` until both slots have moved.
    ///
    /// Never touches the counters; see [`Session::reset_round`].
    pub fn resolve(&self) -> Option<Outcome> {
        if !self.both_moved() {
            return None;
        }
        match (self.moves[0], self.moves[1]) {
            (Some(first), Some(second)) => Some(resolve(first, second)),
            _ => None,
        }
    }

    /// Close the current round.
    ///
    /// Both `has_moved` flags are cleared together. If the round was
    /// complete its outcome is added to the tally and returned; an incomplete
    /// round is discarded without counting.
    pub fn reset_round(&mut self) -> Option<Outcome> {
        let outcome = self.resolve();
        match outcome {
            Some(Outcome::PlayerOneWins) => self.wins[0] += 1,
            Some(Outcome::PlayerTwoWins) => self.wins[1] += 1,
            Some(Outcome::Tie) => self.ties += 1,
            None => {}
        }
        self.has_moved = [false, false];
        outcome
    }

    /// Whether the second player has joined.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Mark the pair complete. Readiness never reverts.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Rounds won by a slot.
    pub fn wins(&self, slot: PlayerSlot) -> u32 {
        self.wins[slot.index()]
    }

    /// Rounds tied.
    pub fn ties(&self) -> u32 {
        self.ties
    }

    /// Completed rounds tallied so far.
    pub fn rounds_played(&self) -> u32 {
        self.wins[0] + self.wins[1] + self.ties
    }
}
