//! A chess rules engine and game orchestrator.
//!
//! The rules layer answers "is this move legal here" and "how does the game
//! stand" over immutable [`Position`] snapshots; the [`game`] module runs a
//! channel-based turn loop between two [`Player`] collaborators, with undo
//! and subscriber notifications. Positions travel as six-field notation
//! strings and moves as UCI tokens.

pub mod board;
pub mod castling;
pub mod coord;
pub mod error;
pub mod game;
pub mod moves;
pub mod piece;
pub mod position;
pub mod rules;

pub use board::Board;
pub use castling::{CastlingRight, CastlingRights};
pub use coord::Coordinate;
pub use error::{EngineFault, NotationError};
pub use game::{Game, HumanHandle, HumanPlayer, Player, PlayerAction, Responder, ScriptedPlayer};
pub use moves::Move;
pub use piece::{Color, Piece, PieceKind};
pub use position::Position;
pub use rules::GameStatus;
