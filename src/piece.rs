use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The rank this color promotes on (and the opponent's home rank).
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }

    /// The rank this color's pawns start on.
    pub fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// Rank direction pawns of this color advance in.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const WHITE_PAWN: Piece = Piece::new(PieceKind::Pawn, Color::White);
    pub const WHITE_KNIGHT: Piece = Piece::new(PieceKind::Knight, Color::White);
    pub const WHITE_BISHOP: Piece = Piece::new(PieceKind::Bishop, Color::White);
    pub const WHITE_ROOK: Piece = Piece::new(PieceKind::Rook, Color::White);
    pub const WHITE_QUEEN: Piece = Piece::new(PieceKind::Queen, Color::White);
    pub const WHITE_KING: Piece = Piece::new(PieceKind::King, Color::White);
    pub const BLACK_PAWN: Piece = Piece::new(PieceKind::Pawn, Color::Black);
    pub const BLACK_KNIGHT: Piece = Piece::new(PieceKind::Knight, Color::Black);
    pub const BLACK_BISHOP: Piece = Piece::new(PieceKind::Bishop, Color::Black);
    pub const BLACK_ROOK: Piece = Piece::new(PieceKind::Rook, Color::Black);
    pub const BLACK_QUEEN: Piece = Piece::new(PieceKind::Queen, Color::Black);
    pub const BLACK_KING: Piece = Piece::new(PieceKind::King, Color::Black);

    pub const fn new(kind: PieceKind, color: Color) -> Piece {
        Piece { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn symbol(self) -> char {
        let letter = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.color {
            Color::White => letter.to_ascii_uppercase(),
            Color::Black => letter,
        }
    }

    /// The letter's case decides the color.
    pub fn from_symbol(symbol: char) -> Option<Piece> {
        let kind = match symbol.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    /// Unicode chess glyph for terminal rendering.
    pub fn figurine(self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::Pawn) => '♙',
            (Color::White, PieceKind::Knight) => '♘',
            (Color::White, PieceKind::Bishop) => '♗',
            (Color::White, PieceKind::Rook) => '♖',
            (Color::White, PieceKind::Queen) => '♕',
            (Color::White, PieceKind::King) => '♔',
            (Color::Black, PieceKind::Pawn) => '♟',
            (Color::Black, PieceKind::Knight) => '♞',
            (Color::Black, PieceKind::Bishop) => '♝',
            (Color::Black, PieceKind::Rook) => '♜',
            (Color::Black, PieceKind::Queen) => '♛',
            (Color::Black, PieceKind::King) => '♚',
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
