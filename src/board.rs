use std::fmt;

use crate::coord::Coordinate;
use crate::error::NotationError;
use crate::piece::Piece;

/// An 8x8 grid of optional pieces. A value type: every "mutation" returns a
/// fresh board, which keeps king-safety probing and undo trivially safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    // squares[rank_index][file_index]
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    pub fn empty() -> Board {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// Parses a FEN placement field. Strict: exactly eight rank segments,
    /// each accounting for exactly eight files.
    pub fn from_notation(text: &str) -> Result<Board, NotationError> {
        let malformed = || NotationError::MalformedNotation(text.to_string());
        let ranks: Vec<&str> = text.split('/').collect();
        if ranks.len() != 8 {
            return Err(malformed());
        }
        let mut board = Board::empty();
        for (row, rank_text) in ranks.iter().enumerate() {
            let rank_index = 7 - row;
            let mut file_index = 0usize;
            let mut previous_was_digit = false;
            for symbol in rank_text.chars() {
                if let Some(skip) = symbol.to_digit(10) {
                    // Adjacent empty-run tokens are forbidden; one digit
                    // covers any run up to a full rank.
                    if previous_was_digit || !(1..=8).contains(&skip) {
                        return Err(malformed());
                    }
                    previous_was_digit = true;
                    file_index += skip as usize;
                } else {
                    previous_was_digit = false;
                    let piece = Piece::from_symbol(symbol).ok_or_else(malformed)?;
                    if file_index >= 8 {
                        return Err(malformed());
                    }
                    board.squares[rank_index][file_index] = Some(piece);
                    file_index += 1;
                }
            }
            if file_index != 8 {
                return Err(malformed());
            }
        }
        Ok(board)
    }

    /// Renders the placement field, run-length-encoding empty squares.
    pub fn to_notation(&self) -> String {
        let mut text = String::new();
        for rank_index in (0..8).rev() {
            let mut empties = 0;
            for file_index in 0..8 {
                match self.squares[rank_index][file_index] {
                    Some(piece) => {
                        if empties > 0 {
                            text.push_str(&empties.to_string());
                            empties = 0;
                        }
                        text.push(piece.symbol());
                    }
                    None => empties += 1,
                }
            }
            if empties > 0 {
                text.push_str(&empties.to_string());
            }
            if rank_index > 0 {
                text.push('/');
            }
        }
        text
    }

    pub fn piece_at(&self, square: Coordinate) -> Option<Piece> {
        self.squares[square.rank_index()][square.file_index()]
    }

    pub fn with_piece(&self, square: Coordinate, piece: Option<Piece>) -> Board {
        let mut board = self.clone();
        board.squares[square.rank_index()][square.file_index()] = piece;
        board
    }

    /// Plain relocation: whatever sits on the origin lands on the
    /// destination. No castling, en passant, or promotion semantics; this
    /// is the scratch operation for attack probing.
    pub fn with_move(&self, mv: &crate::moves::Move) -> Board {
        let piece = self.piece_at(mv.from);
        self.with_piece(mv.from, None).with_piece(mv.to, piece)
    }

    /// Every square holding this exact piece, in file-major scan order.
    pub fn find_all(&self, piece: Piece) -> Vec<Coordinate> {
        Coordinate::all()
            .filter(|square| self.piece_at(*square) == Some(piece))
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for rank_index in (0..8).rev() {
            write!(f, "{} |", rank_index + 1)?;
            for file_index in 0..8 {
                match self.squares[rank_index][file_index] {
                    Some(piece) => write!(f, " {}", piece.figurine())?,
                    None => write!(f, " .")?,
                }
            }
            writeln!(f, " |")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}
