//! Move Resolver
//!
//! Maps a pair of submitted moves to the outcome of the round.
//! Pure and total: no state, no errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::moves::Move;
use crate::game::session::PlayerSlot;

/// Result of one resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Slot 0 won.
    PlayerOneWins,
    /// Slot 1 won.
    PlayerTwoWins,
    /// Both threw the same move.
    Tie,
}

impl Outcome {
    /// Winning slot, or `None` on a tie.
    pub fn winner(self) -> Option<PlayerSlot> {
        match self {
            Outcome::PlayerOneWins => Some(PlayerSlot::One),
            Outcome::PlayerTwoWins => Some(PlayerSlot::Two),
            Outcome::Tie => None,
        }
    }

    /// The same round seen with the players swapped.
    pub fn mirrored(self) -> Outcome {
        match self {
            Outcome::PlayerOneWins => Outcome::PlayerTwoWins,
            Outcome::PlayerTwoWins => Outcome::PlayerOneWins,
            Outcome::Tie => Outcome::Tie,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::PlayerOneWins => "PLAYER 1 WINS",
            Outcome::PlayerTwoWins => "PLAYER 2 WINS",
            Outcome::Tie => "IT'S A TIE",
        })
    }
}

/// Resolve a round where slot 0 threw `first` and slot 1 threw `second`.
#[inline]
pub fn resolve(first: Move, second: Move) -> Outcome {
    if first == second {
        Outcome::Tie
    } else if first.beats() == second {
        Outcome::PlayerOneWins
    } else {
        Outcome::PlayerTwoWins
    }
}
