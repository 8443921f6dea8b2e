//! PGN import: tag-pair headers plus a single movetext section.
//!
//! Comments, variations, and NAGs are stripped rather than preserved; the
//! viewer only needs the mainline. Parsing is all-or-nothing: any token that
//! fails to resolve against the legal moves rejects the whole input.

use std::collections::HashMap;

use crate::position::{MoveError, MoveRecord, Position};

use super::san::{self, SanError};

/// The standard seven-plus-Elo tag roster, with `"Unknown"` for anything the
/// input does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnHeaders {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub white_elo: String,
    pub black: String,
    pub black_elo: String,
    pub result: String,
}

impl Default for PgnHeaders {
    fn default() -> Self {
        let unknown = || "Unknown".to_string();
        Self {
            event: unknown(),
            site: unknown(),
            date: unknown(),
            round: unknown(),
            white: unknown(),
            white_elo: unknown(),
            black: unknown(),
            black_elo: unknown(),
            result: unknown(),
        }
    }
}

impl PgnHeaders {
    fn from_tags(tags: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            tags.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string())
        };
        Self {
            event: get("Event"),
            site: get("Site"),
            date: get("Date"),
            round: get("Round"),
            white: get("White"),
            white_elo: get("WhiteElo"),
            black: get("Black"),
            black_elo: get("BlackElo"),
            result: get("Result"),
        }
    }
}

/// A fully parsed game: headers, starting position, and the mainline.
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub headers: PgnHeaders,
    pub tags: HashMap<String, String>,
    pub initial: Position,
    pub moves: Vec<MoveRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Empty PGN input")]
    Empty,
    #[error("Malformed tag pair: {0}")]
    InvalidTag(String),
    #[error("Invalid FEN tag: {0}")]
    InvalidFen(String),
    #[error("Move {ply}: {source}")]
    InvalidMove {
        ply: usize,
        #[source]
        source: SanError,
    },
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Parse a PGN string into headers and the mainline move list.
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let (tags, movetext) = split_sections(input)?;

    let initial = match tags.get("FEN") {
        Some(fen) => Position::from_fen(fen).map_err(|_| PgnError::InvalidFen(fen.clone()))?,
        None => Position::standard(),
    };

    let mut position = initial.clone();
    let mut moves = Vec::new();

    for raw in strip_annotations(&movetext).split_whitespace() {
        if is_result_token(raw) {
            break;
        }
        let token = strip_move_number(raw);
        if token.is_empty() || token.starts_with('$') {
            continue;
        }

        let mv = san::parse_san(position.board(), token).map_err(|source| {
            PgnError::InvalidMove {
                ply: moves.len() + 1,
                source,
            }
        })?;
        let (next, record) = position.apply_move(mv)?;
        position = next;
        moves.push(record);
    }

    if tags.is_empty() && moves.is_empty() {
        return Err(PgnError::Empty);
    }

    Ok(PgnGame {
        headers: PgnHeaders::from_tags(&tags),
        tags,
        initial,
        moves,
    })
}

/// Separate the tag-pair section from the movetext. Only the first game in a
/// multi-game file is read; the movetext parser stops at the result token.
fn split_sections(input: &str) -> Result<(HashMap<String, String>, String), PgnError> {
    let mut tags = HashMap::new();
    let mut movetext = String::new();
    let mut in_movetext = false;

    for line in input.lines() {
        // Rest-of-line comments can appear in either section.
        let line = line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if !in_movetext && line.starts_with('[') {
            let (key, value) = parse_tag_pair(line)?;
            tags.insert(key, value);
        } else {
            in_movetext = true;
            movetext.push_str(line);
            movetext.push(' ');
        }
    }

    Ok((tags, movetext))
}

fn parse_tag_pair(line: &str) -> Result<(String, String), PgnError> {
    let malformed = || PgnError::InvalidTag(line.to_string());

    let inner = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (key, rest) = inner.split_once(char::is_whitespace).ok_or_else(malformed)?;

    let first = rest.find('"').ok_or_else(malformed)?;
    let last = rest.rfind('"').ok_or_else(malformed)?;
    if first == last {
        return Err(malformed());
    }

    Ok((key.to_string(), rest[first + 1..last].to_string()))
}

/// Drop `{...}` comments and `(...)` variations; both may nest parentheses
/// inside variations, comments may not nest.
fn strip_annotations(movetext: &str) -> String {
    let mut out = String::with_capacity(movetext.len());
    let mut paren_depth = 0usize;
    let mut in_comment = false;

    for c in movetext.chars() {
        match c {
            '{' if paren_depth == 0 => in_comment = true,
            '}' if in_comment => in_comment = false,
            _ if in_comment => {}
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ if paren_depth > 0 => {}
            _ => out.push(c),
        }
    }
    out
}

/// Strip a leading move number ("1.", "12...", also glued forms like "1.e4").
fn strip_move_number(token: &str) -> &str {
    // Zero-style castling starts with a digit; leave it alone.
    if token.starts_with("0-") {
        return token;
    }
    token.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[Event "Casual Game"]
[Site "Paris FRA"]
[Date "1858.11.02"]
[White "Morphy, Paul"]
[Black "Duke Karl / Count Isouard"]
[Result "1-0"]

1. e4 e5 2. Nf3 d6 3. d4 Bg4 {This is a weak move.} 4. dxe5 Bxf3
5. Qxf3 dxe5 6. Bc4 Nf6 7. Qb3 Qe7 8. Nc3 c6 9. Bg5 b5 10. Nxb5 cxb5
11. Bxb5+ Nbd7 12. O-O-O Rd8 13. Rxd7 Rxd7 14. Rd1 Qe6 15. Bxd7+ Nxd7
16. Qb8+ Nxb8 17. Rd8# 1-0"#;

    #[test]
    fn test_parses_full_game() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert_eq!(game.headers.event, "Casual Game");
        assert_eq!(game.headers.white, "Morphy, Paul");
        assert_eq!(game.headers.result, "1-0");
        assert_eq!(game.moves.len(), 33);
        assert_eq!(game.moves[0].san, "e4");
        assert_eq!(game.moves.last().unwrap().san, "Rd8#");
    }

    #[test]
    fn test_missing_headers_default_to_unknown() {
        let game = parse_pgn(SAMPLE).unwrap();
        assert_eq!(game.headers.round, "Unknown");
        assert_eq!(game.headers.white_elo, "Unknown");
        assert_eq!(game.headers.black_elo, "Unknown");
    }

    #[test]
    fn test_variations_and_nags_are_skipped() {
        let pgn = "1. e4 $1 (1. d4 d5 (1... Nf6)) 1... e5 2. Nf3 *";
        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_glued_move_numbers() {
        let game = parse_pgn("1.e4 e5 2.Nf3 Nc6").unwrap();
        assert_eq!(game.moves.len(), 4);
    }

    #[test]
    fn test_fen_tag_sets_initial_position() {
        let pgn = r#"[Event "Study"]
[FEN "8/4P3/8/8/8/8/k7/4K3 w - - 0 1"]

1. e8=Q *"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves.len(), 1);
        assert_eq!(game.moves[0].san, "e8=Q");
        assert_eq!(game.initial.to_fen(), "8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
    }

    #[test]
    fn test_illegal_movetext_is_rejected() {
        let err = parse_pgn("1. e4 e5 2. Ke3").unwrap_err();
        assert!(matches!(err, PgnError::InvalidMove { ply: 3, .. }));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_pgn("this is not a pgn").is_err());
        assert!(matches!(parse_pgn("").unwrap_err(), PgnError::Empty));
        assert!(matches!(parse_pgn("   \n\n  ").unwrap_err(), PgnError::Empty));
    }

    #[test]
    fn test_malformed_tag_is_rejected() {
        assert!(matches!(
            parse_pgn("[Event Casual]\n\n1. e4 *").unwrap_err(),
            PgnError::InvalidTag(_)
        ));
    }

    #[test]
    fn test_result_token_ends_parsing() {
        // A second game after the result marker is ignored.
        let pgn = "[Result \"1/2-1/2\"]\n\n1. e4 e5 1/2-1/2\n\n[Event \"Second\"]\n\n1. d4 *";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.headers.result, "1/2-1/2");
    }

    #[test]
    fn test_headers_only_input() {
        let game = parse_pgn("[Event \"Adjourned\"]\n").unwrap();
        assert!(game.moves.is_empty());
        assert_eq!(game.headers.event, "Adjourned");
    }
}
