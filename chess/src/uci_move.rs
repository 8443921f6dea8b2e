//! Coordinate-move ("UCI") text format: "e2e4", "e7e8q".

use cozy_chess::{Move, Piece, Square};

use crate::converters::{format_piece, format_square, parse_promotion_piece, parse_square};

#[derive(Debug, thiserror::Error)]
pub enum CoordinateMoveError {
    #[error("Invalid coordinate move: {0}")]
    InvalidMove(String),
    #[error("Invalid promotion piece in: {0}")]
    InvalidPromotion(String),
}

/// Parse a four-or-five-character coordinate move into its components.
pub fn parse_coordinate_move(s: &str) -> Result<(Square, Square, Option<Piece>), CoordinateMoveError> {
    if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
        return Err(CoordinateMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2]).ok_or_else(|| CoordinateMoveError::InvalidMove(s.to_string()))?;
    let to = parse_square(&s[2..4]).ok_or_else(|| CoordinateMoveError::InvalidMove(s.to_string()))?;

    let promotion = match s[4..].chars().next() {
        Some(c) => Some(
            parse_promotion_piece(c)
                .ok_or_else(|| CoordinateMoveError::InvalidPromotion(s.to_string()))?,
        ),
        None => None,
    };

    Ok((from, to, promotion))
}

/// Format a move in coordinate notation.
pub fn format_coordinate_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}
