//! Parsing of raw engine report text into a structured evaluation.
//!
//! The report is the engine's accumulated UCI output, e.g.
//! `info depth 15 ... score cp 28 ... pv e2e4 c7c5 ... bestmove e2e4 ponder c7c5`.
//! Successive info lines repeat the score at increasing depth; the last
//! occurrence is the deepest and wins. Malformed input degrades to a neutral
//! report rather than an error.

/// Engine evaluation score. Positive values favor White.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

/// Structured view of a raw engine report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalReport {
    pub score: Option<Score>,
    pub best_move: Option<String>,
}

/// Scan a raw report for `score cp <int>`, `score mate <int>`, and
/// `bestmove <coord>` tokens. Never fails.
pub fn parse_report(raw: &str) -> EvalReport {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut report = EvalReport::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "score" => {
                if let (Some(kind), Some(value)) = (tokens.get(i + 1), tokens.get(i + 2)) {
                    let parsed = value.parse::<i32>().ok();
                    match (*kind, parsed) {
                        ("cp", Some(v)) => report.score = Some(Score::Centipawns(v)),
                        ("mate", Some(v)) => report.score = Some(Score::Mate(v)),
                        _ => {}
                    }
                }
            }
            "bestmove" => {
                // "bestmove (none)" appears in mated positions.
                if let Some(mv) = tokens.get(i + 1).filter(|mv| is_coordinate_move(mv)) {
                    report.best_move = Some((*mv).to_string());
                }
            }
            _ => {}
        }
        i += 1;
    }

    report
}

fn is_coordinate_move(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 4 && b.len() != 5 {
        return false;
    }
    let square_ok = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    square_ok(b[0], b[1])
        && square_ok(b[2], b[3])
        && (b.len() == 4 || matches!(b[4], b'q' | b'r' | b'b' | b'n'))
}

/// Evaluation summary for display: the bar percentage and caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSummary {
    pub score: Option<Score>,
    pub best_move: Option<String>,
    /// White's advantage mapped onto [0, 100]; 50 is equal.
    pub white_advantage_percent: f64,
    /// Caption for the evaluation panel; None when there is no score.
    pub text: Option<String>,
}

impl EvalSummary {
    pub fn from_report(report: &EvalReport) -> Self {
        let (percent, text) = match report.score {
            Some(Score::Centipawns(cp)) => (
                (50.0 + cp as f64 / 10.0).clamp(0.0, 100.0),
                Some(format!("{cp} centipawns")),
            ),
            Some(Score::Mate(m)) if m > 0 => (100.0, Some("Mate for White".to_string())),
            Some(Score::Mate(_)) => (0.0, Some("Mate for Black".to_string())),
            None => (50.0, None),
        };

        Self {
            score: report.score,
            best_move: report.best_move.clone(),
            white_advantage_percent: percent,
            text,
        }
    }
}
