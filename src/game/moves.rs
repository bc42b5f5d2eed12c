//! Move Definitions
//!
//! The closed set of hands a player can throw.
//! Wire names are upper-case (`"ROCK"`, `"PAPER"`, `"SCISSORS"`); parsing
//! accepts any letter case.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single hand thrown by one player in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Move {
    /// Beats scissors.
    Rock,
    /// Beats rock.
    Paper,
    /// Beats paper.
    Scissors,
}

impl Move {
    /// Every move, in wire order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Upper-case wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Move::Rock => "ROCK",
            Move::Paper => "PAPER",
            Move::Scissors => "SCISSORS",
        }
    }

    /// The move this one defeats.
    #[inline]
    pub const fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that names no move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown move: {0:?}")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseMoveError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_any_case() {
        assert_eq!("ROCK".parse::<Move>().unwrap(), Move::Rock);
        assert_eq!("paper".parse::<Move>().unwrap(), Move::Paper);
        assert_eq!("Scissors".parse::<Move>().unwrap(), Move::Scissors);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "lizard".parse::<Move>().unwrap_err();
        assert_eq!(err, ParseMoveError("lizard".to_string()));
        assert!("".parse::<Move>().is_err());
        assert!("R".parse::<Move>().is_err());
    }

    #[test]
    fn test_beats_is_cyclic() {
        for m in Move::ALL {
            assert_ne!(m.beats(), m);
            assert_eq!(m.beats().beats().beats(), m);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Move::Scissors).unwrap(), "\"SCISSORS\"");
        let parsed: Move = serde_json::from_str("\"ROCK\"").unwrap();
        assert_eq!(parsed, Move::Rock);
    }
}
