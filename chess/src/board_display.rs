//! Lightweight 8x8 grid for rendering a position from its FEN.

use crate::types::{PieceColor, PieceKind};

/// Display-only board; no legality knowledge.
#[derive(Debug, Clone)]
pub struct DisplayBoard {
    squares: [Option<(PieceKind, PieceColor)>; 64],
}

impl DisplayBoard {
    /// Parse the placement field of a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, DisplayBoardError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or(DisplayBoardError::InvalidFen)?;

        let mut squares = [None; 64];
        let mut ranks = 0usize;

        for (rank_idx, rank_str) in placement.split('/').enumerate() {
            if rank_idx > 7 {
                return Err(DisplayBoardError::InvalidFen);
            }
            ranks += 1;
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if file > 7 {
                    return Err(DisplayBoardError::InvalidFen);
                }
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    let color = if c.is_uppercase() {
                        PieceColor::White
                    } else {
                        PieceColor::Black
                    };
                    let kind =
                        PieceKind::from_char(c).ok_or(DisplayBoardError::InvalidPiece(c))?;
                    squares[rank * 8 + file] = Some((kind, color));
                    file += 1;
                }
            }
        }

        if ranks != 8 {
            return Err(DisplayBoardError::InvalidFen);
        }
        Ok(DisplayBoard { squares })
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<(PieceKind, PieceColor)> {
        if file > 7 || rank > 7 {
            return None;
        }
        self.squares[rank as usize * 8 + file as usize]
    }

    /// FEN-style character for a square ('N', 'p', ...), or None when empty.
    pub fn char_at(&self, file: u8, rank: u8) -> Option<char> {
        self.piece_at(file, rank).map(|(kind, color)| match color {
            PieceColor::White => kind.to_char_upper(),
            PieceColor::Black => kind.to_char_lower(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayBoardError {
    #[error("Invalid FEN string")]
    InvalidFen,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
}
