//! Text rendering of session snapshots. Everything here is a pure function of
//! the snapshot plus the local view options, so a redraw can never disagree
//! with the session state it was given.

use chess::{parse_square, DisplayBoard};
use session::{HighlightKind, SessionSnapshot};

/// Presentation-only toggles, owned by the terminal loop rather than the
/// session.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    /// Render from Black's point of view.
    pub flipped: bool,
    /// Show the best-move arrow line.
    pub show_arrows: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            flipped: false,
            show_arrows: true,
        }
    }
}

/// Full textual view: metadata, board, move list, evaluation bar.
pub fn render_snapshot(snap: &SessionSnapshot, opts: &ViewOptions) -> String {
    let mut out = String::new();

    if let Some(metadata) = &snap.metadata {
        out.push_str(&format!(
            "{} vs {} | {} ({}) | {}\n",
            metadata.white, metadata.black, metadata.event, metadata.date, metadata.result
        ));
    }

    out.push_str(&render_board(snap, opts));

    out.push_str(&format!(
        "\n{} to move | ply {}/{}\n",
        snap.side_to_move,
        snap.ply_index,
        snap.history.len()
    ));

    if !snap.history.is_empty() {
        out.push_str(&render_move_list(snap));
        out.push('\n');
    }

    out.push_str(&render_evaluation(snap));
    if opts.show_arrows {
        if let Some(arrow) = &snap.best_move_arrow {
            out.push_str(&format!("Best move: {} -> {}\n", arrow.from, arrow.to));
        }
    }

    out
}

/// The 8x8 grid with rank/file labels. Selected squares are bracketed,
/// legal targets parenthesized.
pub fn render_board(snap: &SessionSnapshot, opts: &ViewOptions) -> String {
    let board = match DisplayBoard::from_fen(&snap.fen) {
        Ok(board) => board,
        Err(_) => return format!("<unrenderable position: {}>\n", snap.fen),
    };

    // Highlight lookup keyed by (file, rank).
    let mut marks = [[None::<HighlightKind>; 8]; 8];
    for highlight in &snap.highlights {
        if let Some(sq) = parse_square(&highlight.square) {
            marks[sq.file() as usize][sq.rank() as usize] = Some(highlight.kind);
        }
    }

    let ranks: Vec<u8> = if opts.flipped {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };
    let files: Vec<u8> = if opts.flipped {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} ", rank + 1));
        for &file in &files {
            let piece = board.char_at(file, rank).unwrap_or('.');
            let cell = match marks[file as usize][rank as usize] {
                Some(HighlightKind::Selected) => format!("[{}]", piece),
                Some(HighlightKind::LegalTarget) => format!("({})", piece),
                None => format!(" {} ", piece),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for &file in &files {
        out.push_str(&format!(" {} ", (b'a' + file) as char));
    }
    out.push('\n');
    out
}

/// Move list in numbered pairs, with a marker at the current ply.
fn render_move_list(snap: &SessionSnapshot) -> String {
    let mut out = String::new();
    for (i, mv) in snap.history.iter().enumerate() {
        if i % 2 == 0 {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{}.", i / 2 + 1));
        }
        out.push(' ');
        out.push_str(&mv.san);
        if i + 1 == snap.ply_index {
            out.push('*');
        }
    }
    out
}

/// The evaluation bar line: a percent gauge plus advantage text.
pub fn render_evaluation(snap: &SessionSnapshot) -> String {
    if snap.evaluating {
        return "Evaluating...\n".to_string();
    }
    let Some(summary) = &snap.evaluation else {
        return "No evaluation yet.\n".to_string();
    };

    let percent = summary.white_advantage_percent;
    let caption = if percent > 50.0 {
        "White Advantage"
    } else if percent < 50.0 {
        "Black Advantage"
    } else {
        "Equal"
    };

    // 20-cell gauge, filled from the White side.
    let filled = ((percent / 5.0).round() as usize).min(20);
    let bar: String = "#".repeat(filled) + &"-".repeat(20 - filled);

    let detail = summary.text.as_deref().unwrap_or("");
    if detail.is_empty() {
        format!("[{}] {:.1}% {}\n", bar, percent, caption)
    } else {
        format!("[{}] {:.1}% {} ({})\n", bar, percent, caption, detail)
    }
}
