use std::fmt;

use lazy_static::lazy_static;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::board::Board;
use crate::castling::{CastlingRight, CastlingRights};
use crate::coord::Coordinate;
use crate::error::{EngineFault, NotationError};
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceKind};

pub const INITIAL_NOTATION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

lazy_static! {
    static ref INITIAL: Position =
        Position::from_notation(INITIAL_NOTATION).expect("initial position notation parses");
}

/// A full game snapshot: board, side to move, castling rights, en-passant
/// target, halfmove clock, fullmove number. Immutable; `after_move` derives
/// successors, nothing mutates in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Coordinate>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    pub fn initial() -> Position {
        INITIAL.clone()
    }

    pub fn from_parts(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Coordinate>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Position {
        Position {
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    /// Parses the six-field notation string. Strict on every field.
    pub fn from_notation(text: &str) -> Result<Position, NotationError> {
        let malformed = || NotationError::MalformedNotation(text.to_string());
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(malformed());
        }
        let board = Board::from_notation(fields[0])?;
        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(malformed()),
        };
        let castling_rights = CastlingRights::from_field(fields[2])?;
        let en_passant = match fields[3] {
            "-" => None,
            square => Some(Coordinate::from_algebraic(square)?),
        };
        let halfmove_clock: u32 = fields[4].parse().map_err(|_| malformed())?;
        let fullmove_number: u32 = fields[5].parse().map_err(|_| malformed())?;
        if fullmove_number < 1 {
            return Err(malformed());
        }
        Ok(Position {
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn to_notation(&self) -> String {
        let en_passant = match self.en_passant {
            Some(square) => square.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            self.board.to_notation(),
            match self.side_to_move {
                Color::White => "w",
                Color::Black => "b",
            },
            self.castling_rights.to_field(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Coordinate> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Same snapshot with a substituted board. Used for scratch king-safety
    /// probing; clocks, rights and side to move carry over unchanged.
    pub fn with_board(&self, board: Board) -> Position {
        Position {
            board,
            ..self.clone()
        }
    }

    /// Derives the successor position. The move is taken at face value: the
    /// caller validates legality; here an empty origin is an integrity
    /// fault, not a rejection.
    pub fn after_move(&self, mv: &Move) -> Result<Position, EngineFault> {
        let piece = self
            .board
            .piece_at(mv.from)
            .ok_or(EngineFault::MissingPiece(mv.from))?;
        let capture = self.board.piece_at(mv.to).is_some();

        let board = if CastlingRight::is_castling_move(piece, mv) {
            let right = CastlingRight::from_king_move(mv)
                .ok_or_else(|| EngineFault::InvalidCastling(mv.to_string()))?;
            self.board
                .with_move(&right.king_move())
                .with_move(&right.rook_move())
        } else {
            let landing = mv.promotion.unwrap_or(piece);
            let mut board = self
                .board
                .with_piece(mv.from, None)
                .with_piece(mv.to, Some(landing));
            if self.en_passant == Some(mv.to) {
                // The captured pawn stands one rank behind the target.
                let step = if mv.to.rank_number() == 3 { 1 } else { -1 };
                if let Some(captured) = mv.to.offset(0, step) {
                    board = board.with_piece(captured, None);
                }
            }
            board
        };

        Ok(Position {
            board,
            side_to_move: self.side_to_move.opponent(),
            castling_rights: self.castling_rights_after(mv),
            en_passant: self.en_passant_after(piece, mv),
            halfmove_clock: if capture { 0 } else { self.halfmove_clock + 1 },
            fullmove_number: if self.side_to_move == Color::Black {
                self.fullmove_number + 1
            } else {
                self.fullmove_number
            },
        })
    }

    /// A right survives only while king and rook sit on their home squares
    /// and the move touches neither of them. Landing on the rook's home
    /// square (a capture) revokes the right too.
    fn castling_rights_after(&self, mv: &Move) -> CastlingRights {
        let mut rights = CastlingRights::none();
        for right in self.castling_rights.iter() {
            let king_home = right.king_home();
            let rook_home = right.rook_home();
            let king_in_place = self.board.piece_at(king_home)
                == Some(Piece::new(PieceKind::King, right.color()));
            let rook_in_place = self.board.piece_at(rook_home)
                == Some(Piece::new(PieceKind::Rook, right.color()));
            let touched =
                mv.from == king_home || mv.from == rook_home || mv.to == rook_home;
            if king_in_place && rook_in_place && !touched {
                rights.insert(right);
            }
        }
        rights
    }

    fn en_passant_after(&self, piece: Piece, mv: &Move) -> Option<Coordinate> {
        if piece.kind == PieceKind::Pawn && mv.rank_delta().abs() == 2 {
            mv.from.offset(0, mv.rank_direction())
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_notation())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_notation())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Position, D::Error> {
        let text = String::deserialize(deserializer)?;
        Position::from_notation(&text).map_err(D::Error::custom)
    }
}
