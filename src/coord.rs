use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NotationError;

const FILE_CHARS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// A square on the board, as a file (a-h) and a rank (1-8). Stored as
/// 0-based indices; construction is bounds-checked everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    file: u8,
    rank: u8,
}

impl Coordinate {
    /// Bounds-checked construction from 0-based indices. Every geometric
    /// offset in the crate funnels through here, so stepping off the board
    /// yields `None` instead of wrapping.
    pub fn from_indices(file: i8, rank: i8) -> Option<Coordinate> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Coordinate {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Parses algebraic form such as "e4".
    pub fn from_algebraic(text: &str) -> Result<Coordinate, NotationError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => Some(Coordinate {
                file: file as u8 - b'a',
                rank: rank as u8 - b'1',
            }),
            _ => None,
        }
        .ok_or_else(|| NotationError::MalformedCoordinate(text.to_string()))
    }

    /// The square reached by moving `file_delta` files and `rank_delta`
    /// ranks, or `None` when that falls off the board.
    pub fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Coordinate> {
        Coordinate::from_indices(self.file as i8 + file_delta, self.rank as i8 + rank_delta)
    }

    pub fn file_index(self) -> usize {
        self.file as usize
    }

    pub fn rank_index(self) -> usize {
        self.rank as usize
    }

    pub fn file_char(self) -> char {
        FILE_CHARS[self.file as usize]
    }

    /// 1-based rank number as written in algebraic notation.
    pub fn rank_number(self) -> u8 {
        self.rank + 1
    }

    /// All 64 squares in file-major order (a1, a2, .., a8, b1, ..). This is
    /// the canonical scan order for piece lookups.
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..8u8).flat_map(|file| (0..8u8).map(move |rank| Coordinate { file, rank }))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_number())
    }
}
