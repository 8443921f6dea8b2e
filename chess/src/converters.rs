//! Square and piece text conversions shared across the workspace.

use cozy_chess::{File, Piece, Rank, Square};

/// Format a square as algebraic coordinates ("e4").
pub fn format_square(sq: Square) -> String {
    let file = (b'a' + sq.file() as u8) as char;
    let rank = (b'1' + sq.rank() as u8) as char;
    format!("{}{}", file, rank)
}

/// Parse algebraic coordinates ("e4") into a square.
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = match chars.next()? {
        c @ 'a'..='h' => File::index(c as usize - 'a' as usize),
        _ => return None,
    };
    let rank = match chars.next()? {
        c @ '1'..='8' => Rank::index(c as usize - '1' as usize),
        _ => return None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

/// Format a piece as its lowercase letter ('q'), the UCI promotion form.
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

/// Parse a promotion letter ('q', 'r', 'b', 'n') into a piece.
pub fn parse_promotion_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}
