//! Pure derivations of display state. Recomputed in full on every snapshot;
//! nothing here is patched incrementally, so stale entries cannot accumulate.

use chess::{format_square, parse_coordinate_move, Position};
use cozy_chess::Square;

use super::snapshot::{Arrow, Highlight, HighlightKind};

/// Highlight set for a selection: the selected square plus its legal targets.
/// Empty when nothing is selected.
pub fn highlights_for(position: &Position, selection: Option<Square>) -> Vec<Highlight> {
    let Some(selected) = selection else {
        return Vec::new();
    };

    let mut highlights = vec![Highlight {
        square: format_square(selected),
        kind: HighlightKind::Selected,
    }];
    for target in position.legal_targets(selected) {
        highlights.push(Highlight {
            square: format_square(target),
            kind: HighlightKind::LegalTarget,
        });
    }
    highlights
}

/// Arrow endpoints for a best move in coordinate notation, if it parses.
pub fn arrow_for(best_move: Option<&str>) -> Option<Arrow> {
    let (from, to, _) = parse_coordinate_move(best_move?).ok()?;
    Some(Arrow {
        from: format_square(from),
        to: format_square(to),
    })
}
