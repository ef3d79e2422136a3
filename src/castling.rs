use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::error::NotationError;
use crate::moves::Move;
use crate::piece::{Color, Piece, PieceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CastlingRight {
    WhiteKingside,
    WhiteQueenside,
    BlackKingside,
    BlackQueenside,
}

struct CastlingGeometry {
    king_move: Move,
    rook_move: Move,
    between: Vec<Coordinate>,
}

fn geometry(king_move: &str, rook_move: &str, between: &[&str]) -> CastlingGeometry {
    // Literals below are fixed board geometry; a parse failure here is a
    // typo in this file, not a runtime condition.
    CastlingGeometry {
        king_move: Move::from_uci(king_move).unwrap(),
        rook_move: Move::from_uci(rook_move).unwrap(),
        between: between
            .iter()
            .map(|square| Coordinate::from_algebraic(square).unwrap())
            .collect(),
    }
}

lazy_static! {
    static ref GEOMETRY: [CastlingGeometry; 4] = [
        geometry("e1g1", "h1f1", &["f1", "g1"]),
        geometry("e1c1", "a1d1", &["d1", "c1", "b1"]),
        geometry("e8g8", "h8f8", &["f8", "g8"]),
        geometry("e8c8", "a8d8", &["d8", "c8", "b8"]),
    ];
}

impl CastlingRight {
    pub const ALL: [CastlingRight; 4] = [
        CastlingRight::WhiteKingside,
        CastlingRight::WhiteQueenside,
        CastlingRight::BlackKingside,
        CastlingRight::BlackQueenside,
    ];

    fn table(self) -> &'static CastlingGeometry {
        &GEOMETRY[self as usize]
    }

    pub fn color(self) -> Color {
        match self {
            CastlingRight::WhiteKingside | CastlingRight::WhiteQueenside => Color::White,
            CastlingRight::BlackKingside | CastlingRight::BlackQueenside => Color::Black,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CastlingRight::WhiteKingside => 'K',
            CastlingRight::WhiteQueenside => 'Q',
            CastlingRight::BlackKingside => 'k',
            CastlingRight::BlackQueenside => 'q',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<CastlingRight> {
        match symbol {
            'K' => Some(CastlingRight::WhiteKingside),
            'Q' => Some(CastlingRight::WhiteQueenside),
            'k' => Some(CastlingRight::BlackKingside),
            'q' => Some(CastlingRight::BlackQueenside),
            _ => None,
        }
    }

    /// The king's two-square move that performs this castle.
    pub fn king_move(self) -> Move {
        self.table().king_move
    }

    /// The rook relocation paired with the king's move.
    pub fn rook_move(self) -> Move {
        self.table().rook_move
    }

    pub fn king_home(self) -> Coordinate {
        self.table().king_move.from
    }

    pub fn rook_home(self) -> Coordinate {
        self.table().rook_move.from
    }

    /// Squares strictly between king and rook, walking from the king. All
    /// must be empty to castle, and all are attack-checked (including the
    /// b-file square on the queenside).
    pub fn between_squares(self) -> &'static [Coordinate] {
        &self.table().between
    }

    /// Recognizes the four castling king moves by their endpoints.
    pub fn from_king_move(mv: &Move) -> Option<CastlingRight> {
        CastlingRight::ALL
            .into_iter()
            .find(|right| right.king_move().from == mv.from && right.king_move().to == mv.to)
    }

    /// Whether `mv` performed by `piece` is a castling attempt. The king's
    /// color must match the right: a black king on e1 sliding to g1 is a
    /// plain king move, not a castle.
    pub fn is_castling_move(piece: Piece, mv: &Move) -> bool {
        match CastlingRight::from_king_move(mv) {
            Some(right) => piece.kind == PieceKind::King && piece.color == right.color(),
            None => false,
        }
    }
}

impl fmt::Display for CastlingRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The set of castling rights a position still carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    white_kingside: bool,
    white_queenside: bool,
    black_kingside: bool,
    black_queenside: bool,
}

impl CastlingRights {
    pub fn none() -> CastlingRights {
        CastlingRights::default()
    }

    pub fn full() -> CastlingRights {
        CastlingRights {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    fn flag(&mut self, right: CastlingRight) -> &mut bool {
        match right {
            CastlingRight::WhiteKingside => &mut self.white_kingside,
            CastlingRight::WhiteQueenside => &mut self.white_queenside,
            CastlingRight::BlackKingside => &mut self.black_kingside,
            CastlingRight::BlackQueenside => &mut self.black_queenside,
        }
    }

    pub fn contains(self, right: CastlingRight) -> bool {
        match right {
            CastlingRight::WhiteKingside => self.white_kingside,
            CastlingRight::WhiteQueenside => self.white_queenside,
            CastlingRight::BlackKingside => self.black_kingside,
            CastlingRight::BlackQueenside => self.black_queenside,
        }
    }

    pub fn insert(&mut self, right: CastlingRight) {
        *self.flag(right) = true;
    }

    pub fn remove(&mut self, right: CastlingRight) {
        *self.flag(right) = false;
    }

    pub fn is_empty(self) -> bool {
        CastlingRight::ALL.iter().all(|right| !self.contains(*right))
    }

    /// Held rights in canonical K Q k q order.
    pub fn iter(self) -> impl Iterator<Item = CastlingRight> {
        CastlingRight::ALL
            .into_iter()
            .filter(move |right| self.contains(*right))
    }

    /// Parses the FEN rights field: "-" or a string of K/Q/k/q symbols.
    pub fn from_field(text: &str) -> Result<CastlingRights, NotationError> {
        if text == "-" {
            return Ok(CastlingRights::none());
        }
        if text.is_empty() {
            return Err(NotationError::MalformedNotation(text.to_string()));
        }
        let mut rights = CastlingRights::none();
        for symbol in text.chars() {
            let right = CastlingRight::from_symbol(symbol)
                .ok_or_else(|| NotationError::MalformedNotation(text.to_string()))?;
            rights.insert(right);
        }
        Ok(rights)
    }

    pub fn to_field(self) -> String {
        if self.is_empty() {
            "-".to_string()
        } else {
            self.iter().map(|right| right.symbol()).collect()
        }
    }
}
