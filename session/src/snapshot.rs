use chess::PgnHeaders;
use cozy_chess::GameStatus;
use evaluation::EvalSummary;

/// Complete, immutable snapshot of session state.
/// Sent to subscribers on every state change and returned from commands.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub fen: String,
    pub side_to_move: String,
    pub status: GameStatus,
    /// Current ply pointer; the position is `history[..ply_index]` replayed.
    pub ply_index: usize,
    pub history: Vec<MoveView>,
    pub selection: Option<String>,
    /// Derived from `(fen, selection)`; recomputed, never patched.
    pub highlights: Vec<Highlight>,
    /// Last accepted evaluation for the displayed position, if any.
    pub evaluation: Option<EvalSummary>,
    /// True while an evaluation request is in flight.
    pub evaluating: bool,
    /// Derived from the accepted evaluation's best move.
    pub best_move_arrow: Option<Arrow>,
    pub metadata: Option<PgnHeaders>,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// A single move in the history view.
#[derive(Debug, Clone)]
pub struct MoveView {
    pub san: String,
    pub from: String,
    pub to: String,
    pub fen_after: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub square: String,
    pub kind: HighlightKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Selected,
    LegalTarget,
}

/// Best-move arrow endpoints, in algebraic coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub from: String,
    pub to: String,
}
