//! Standard Algebraic Notation over cozy-chess boards.
//!
//! Parsing works by rendering every legal move and matching the normalized
//! token against it, so the parser accepts exactly what the formatter emits
//! (plus zero-style castling and stripped check/annotation suffixes).

use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::converters::format_square;

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move matches: {0}")]
    NoLegalMove(String),
    #[error("Invalid SAN token: {0}")]
    InvalidFormat(String),
}

/// Format a legal move as SAN, including a check or checkmate suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = format_san_plain(board, mv);

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won {
            '#'
        } else {
            '+'
        });
    }
    san
}

/// Format a legal move as SAN without the check/checkmate suffix.
pub fn format_san_plain(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        // Not reachable for legal moves; render something diagnosable.
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };
    let side = board.side_to_move();

    // cozy-chess encodes castling as king-takes-own-rook.
    if piece == Piece::King && board.color_on(mv.to) == Some(side) {
        return if mv.to.file() > mv.from.file() {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let captures_en_passant =
        piece == Piece::Pawn && mv.from.file() != mv.to.file() && board.piece_on(mv.to).is_none();
    let is_capture = board.color_on(mv.to) == Some(!side) || captures_en_passant;

    let mut san = String::new();
    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_char(mv.from));
        }
    } else {
        san.push(piece_letter(piece));
        if piece != Piece::King {
            push_disambiguation(&mut san, board, mv, piece);
        }
    }

    if is_capture {
        san.push('x');
    }
    san.push_str(&format_square(mv.to));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(piece_letter(promo));
    }

    san
}

/// Resolve a SAN token against the legal moves of `board`.
pub fn parse_san(board: &Board, token: &str) -> Result<Move, SanError> {
    let trimmed = token.trim_end_matches(['+', '#', '!', '?']);
    let normalized = match trimmed {
        "0-0" => "O-O",
        "0-0-0" => "O-O-O",
        t => t,
    };
    if normalized.is_empty() {
        return Err(SanError::InvalidFormat(token.to_string()));
    }

    let mut found = None;
    board.generate_moves(|mvs| {
        for mv in mvs {
            if format_san_plain(board, mv) == normalized {
                found = Some(mv);
                return true;
            }
        }
        false
    });

    found.ok_or_else(|| SanError::NoLegalMove(token.to_string()))
}

/// Minimal disambiguation: file if it suffices, else rank, else both.
fn push_disambiguation(san: &mut String, board: &Board, mv: Move, piece: Piece) {
    let mut rivals: Vec<Square> = Vec::new();
    board.generate_moves(|mvs| {
        for other in mvs {
            if other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
            {
                rivals.push(other.from);
            }
        }
        false
    });
    rivals.dedup();

    if rivals.is_empty() {
        return;
    }
    if rivals.iter().all(|r| r.file() != mv.from.file()) {
        san.push(file_char(mv.from));
    } else if rivals.iter().all(|r| r.rank() != mv.from.rank()) {
        san.push(rank_char(mv.from));
    } else {
        san.push(file_char(mv.from));
        san.push(rank_char(mv.from));
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::parse_square;

    fn board(fen: &str) -> Board {
        fen.parse().unwrap()
    }

    fn mv(from: &str, to: &str) -> Move {
        Move {
            from: parse_square(from).unwrap(),
            to: parse_square(to).unwrap(),
            promotion: None,
        }
    }

    #[test]
    fn test_pawn_push_and_knight_move() {
        let b = Board::default();
        assert_eq!(format_san(&b, mv("e2", "e4")), "e4");
        assert_eq!(format_san(&b, mv("g1", "f3")), "Nf3");
    }

    #[test]
    fn test_file_disambiguation() {
        // Two knights, b1 and f1, can both reach d2.
        let b = board("k7/8/8/8/8/8/8/KN3N2 w - - 0 1");
        assert_eq!(format_san_plain(&b, mv("b1", "d2")), "Nbd2");
        assert_eq!(format_san_plain(&b, mv("f1", "d2")), "Nfd2");
    }

    #[test]
    fn test_rank_disambiguation() {
        // Rooks on a1 and a5 share the a-file.
        let b = board("7k/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(format_san_plain(&b, mv("a1", "a3")), "R1a3");
        assert_eq!(format_san_plain(&b, mv("a5", "a3")), "R5a3");
    }

    #[test]
    fn test_check_and_mate_suffixes() {
        let b = board("k7/8/1K6/8/8/8/8/7R w - - 0 1");
        assert_eq!(format_san(&b, mv("h1", "h8")), "Rh8#");
        let b = board("k7/8/2K5/8/8/8/8/7R w - - 0 1");
        assert_eq!(format_san(&b, mv("h1", "h8")), "Rh8+");
    }

    #[test]
    fn test_parse_round_trips_legal_moves() {
        let b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut all = Vec::new();
        b.generate_moves(|mvs| {
            all.extend(mvs);
            false
        });
        for legal in all {
            let san = format_san(&b, legal);
            assert_eq!(parse_san(&b, &san).unwrap(), legal, "token {san}");
        }
    }

    #[test]
    fn test_parse_castling_variants() {
        let b = board("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let kingside = parse_san(&b, "O-O").unwrap();
        assert_eq!(kingside, mv("e1", "h1"));
        assert_eq!(parse_san(&b, "0-0").unwrap(), kingside);
        assert_eq!(parse_san(&b, "O-O-O").unwrap(), mv("e1", "a1"));
    }

    #[test]
    fn test_parse_strips_annotation_suffixes() {
        let b = Board::default();
        assert_eq!(parse_san(&b, "e4!?").unwrap(), mv("e2", "e4"));
        assert_eq!(parse_san(&b, "Nf3!").unwrap(), mv("g1", "f3"));
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        let b = Board::default();
        assert!(parse_san(&b, "e5").is_err());
        assert!(parse_san(&b, "garbage").is_err());
        assert!(parse_san(&b, "").is_err());
    }
}
