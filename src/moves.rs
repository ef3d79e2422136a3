use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::NotationError;
use crate::piece::Piece;

lazy_static! {
    static ref UCI_MOVE: Regex =
        Regex::new(r"^([a-h][1-8])([a-h][1-8])([pnbrqkPNBRQK])?$").unwrap();
}

/// A move as the player states it: origin, destination, and an optional
/// promotion piece. Whether it is legal is the rules layer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coordinate,
    pub to: Coordinate,
    pub promotion: Option<Piece>,
}

impl Move {
    pub fn new(from: Coordinate, to: Coordinate) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Coordinate, to: Coordinate, promotion: Piece) -> Move {
        Move {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parses a UCI token such as "e2e4" or "g7g8Q". The promotion letter's
    /// case selects the promoted piece's color.
    pub fn from_uci(text: &str) -> Result<Move, NotationError> {
        let captures = UCI_MOVE
            .captures(text)
            .ok_or_else(|| NotationError::MalformedNotation(text.to_string()))?;
        let from = Coordinate::from_algebraic(&captures[1])?;
        let to = Coordinate::from_algebraic(&captures[2])?;
        let promotion = match captures.get(3) {
            Some(symbol) => {
                let symbol = symbol.as_str().chars().next().ok_or_else(|| {
                    NotationError::MalformedNotation(text.to_string())
                })?;
                Some(Piece::from_symbol(symbol).ok_or_else(|| {
                    NotationError::MalformedNotation(text.to_string())
                })?)
            }
            None => None,
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }

    pub fn file_delta(&self) -> i8 {
        self.to.file_index() as i8 - self.from.file_index() as i8
    }

    pub fn rank_delta(&self) -> i8 {
        self.to.rank_index() as i8 - self.from.rank_index() as i8
    }

    pub fn file_direction(&self) -> i8 {
        self.file_delta().signum()
    }

    pub fn rank_direction(&self) -> i8 {
        self.rank_delta().signum()
    }

    pub fn is_diagonal(&self) -> bool {
        self.file_delta() != 0 && self.file_delta().abs() == self.rank_delta().abs()
    }

    pub fn is_orthogonal(&self) -> bool {
        (self.file_delta() == 0) != (self.rank_delta() == 0)
    }

    /// Whether the move runs along a straight line a sliding piece could
    /// walk. Zero-length moves are not traversable.
    pub fn is_traversable(&self) -> bool {
        self.is_diagonal() || self.is_orthogonal()
    }

    /// The squares stepped through from origin (exclusive) to destination
    /// (inclusive), in order. Empty for non-traversable moves.
    pub fn traversal_squares(&self) -> Vec<Coordinate> {
        let mut squares = Vec::new();
        if !self.is_traversable() {
            return squares;
        }
        let (file_step, rank_step) = (self.file_direction(), self.rank_direction());
        let mut current = self.from;
        while current != self.to {
            match current.offset(file_step, rank_step) {
                Some(next) => {
                    squares.push(next);
                    current = next;
                }
                // Unreachable for a traversable move; bail rather than spin.
                None => return squares,
            }
        }
        squares
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.symbol())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Piece;

    fn mv(text: &str) -> Move {
        Move::from_uci(text).unwrap()
    }

    #[test]
    fn parses_plain_and_promotion_tokens() {
        let plain = mv("e2e4");
        assert_eq!(plain.from.to_string(), "e2");
        assert_eq!(plain.to.to_string(), "e4");
        assert_eq!(plain.promotion, None);

        assert_eq!(mv("g7g8Q").promotion, Some(Piece::WHITE_QUEEN));
        assert_eq!(mv("g2g1q").promotion, Some(Piece::BLACK_QUEEN));
        assert_eq!(mv("a7a8N").promotion, Some(Piece::WHITE_KNIGHT));
    }

    #[test]
    fn rejects_malformed_tokens() {
        for text in ["", "e2", "e2e", "e2e9", "i2i4", "e2e4x", "e2e4QQ", "e2 e4"] {
            assert_eq!(
                Move::from_uci(text),
                Err(NotationError::MalformedNotation(text.to_string())),
                "'{}' should not parse",
                text
            );
        }
    }

    #[test]
    fn formats_back_to_uci() {
        assert_eq!(mv("e2e4").to_string(), "e2e4");
        assert_eq!(mv("g7g8Q").to_string(), "g7g8Q");
        assert_eq!(mv("b2b1r").to_string(), "b2b1r");
    }

    #[test]
    fn classifies_directions() {
        assert!(mv("a1h8").is_diagonal());
        assert!(!mv("a1h8").is_orthogonal());
        assert!(mv("a1a8").is_orthogonal());
        assert!(mv("a1h1").is_orthogonal());
        assert!(!mv("a1b3").is_traversable());
        assert!(!mv("a1a1").is_traversable());
    }

    #[test]
    fn traversal_excludes_origin_includes_destination() {
        let squares: Vec<String> = mv("a1a4")
            .traversal_squares()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(squares, vec!["a2", "a3", "a4"]);
        assert!(mv("a1a1").traversal_squares().is_empty());
        assert!(mv("a1b3").traversal_squares().is_empty());
    }
}
