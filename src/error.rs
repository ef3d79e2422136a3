use std::error::Error;
use std::fmt;

use crate::coord::Coordinate;
use crate::moves::Move;

/// Text that could not be understood as chess data. Always a problem with
/// the input, never with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    MalformedCoordinate(String),
    MalformedNotation(String),
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::MalformedCoordinate(text) => {
                write!(f, "malformed coordinate '{}': expected a file a-h followed by a rank 1-8", text)
            }
            NotationError::MalformedNotation(text) => {
                write!(f, "malformed notation '{}'", text)
            }
        }
    }
}

impl Error for NotationError {}

/// Integrity faults: a broken internal invariant or a misbehaving
/// non-interactive collaborator. These are bugs, not bad user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    /// An operation assumed a piece on a square that turned out to be empty.
    MissingPiece(Coordinate),
    /// A move was treated as castling but matches no castling geometry.
    InvalidCastling(String),
    /// A non-interactive player produced a move the rules reject.
    IllegalEngineMove(Move),
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFault::MissingPiece(square) => {
                write!(f, "no piece on {} where one was required", square)
            }
            EngineFault::InvalidCastling(text) => {
                write!(f, "'{}' does not name a castling move", text)
            }
            EngineFault::IllegalEngineMove(mv) => {
                write!(f, "engine player produced illegal move {}", mv)
            }
        }
    }
}

impl Error for EngineFault {}
