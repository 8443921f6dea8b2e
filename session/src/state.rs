use chess::{format_square, parse_coordinate_move, MoveRecord, PgnHeaders, Position};
use cozy_chess::{Piece, Square};
use evaluation::EvalSummary;

use super::commands::{ClickOutcome, SessionError};
use super::derive::{arrow_for, highlights_for};
use super::snapshot::{MoveView, SessionSnapshot};

/// An accepted evaluation, tagged with the ply it was issued for.
#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    pub summary: EvalSummary,
    pub for_ply: usize,
}

/// Internal mutable state, owned entirely by the session actor. No locks.
///
/// Invariants held across every transition:
/// - `ply_index <= history.len()`
/// - `current` equals `initial` with `history[..ply_index]` replayed
/// - `selection`, when set, names an occupied square of `current`
/// - at most one evaluation request id is pending
pub(crate) struct SessionState {
    pub session_id: String,
    initial: Position,
    history: Vec<MoveRecord>,
    ply_index: usize,
    current: Position,
    selection: Option<Square>,
    metadata: Option<PgnHeaders>,
    evaluation: Option<Evaluation>,
    pending_eval: Option<u64>,
    eval_seq: u64,
}

impl SessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            initial: Position::standard(),
            history: Vec::new(),
            ply_index: 0,
            current: Position::standard(),
            selection: None,
            metadata: None,
            evaluation: None,
            pending_eval: None,
            eval_seq: 0,
        }
    }

    /// Build a full snapshot of the current state. Highlights and the arrow
    /// are derived fresh here, never stored.
    pub fn snapshot(&self) -> SessionSnapshot {
        let history = self
            .history
            .iter()
            .map(|record| MoveView {
                san: record.san.clone(),
                from: format_square(record.from),
                to: format_square(record.to),
                fen_after: record.fen_after.clone(),
            })
            .collect();

        let evaluation = self.evaluation.as_ref().map(|e| e.summary.clone());
        let best_move_arrow = arrow_for(
            self.evaluation
                .as_ref()
                .and_then(|e| e.summary.best_move.as_deref()),
        );

        SessionSnapshot {
            session_id: self.session_id.clone(),
            fen: self.current.to_fen(),
            side_to_move: self.current.side_to_move().to_string(),
            status: self.current.status(),
            ply_index: self.ply_index,
            history,
            selection: self.selection.map(format_square),
            highlights: highlights_for(&self.current, self.selection),
            evaluation,
            evaluating: self.pending_eval.is_some(),
            best_move_arrow,
            metadata: self.metadata.clone(),
            can_undo: self.ply_index > 0,
            can_redo: self.ply_index < self.history.len(),
        }
    }

    /// Apply a move against the current position. A legal move played while
    /// `ply_index < history.len()` is a divergent branch: the redoable suffix
    /// is discarded before appending. An illegal move changes nothing, the
    /// selection included.
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<SessionSnapshot, SessionError> {
        let (next, record) = self
            .current
            .apply(from, to, promotion)
            .map_err(|e| SessionError::IllegalMove(e.to_string()))?;

        if self.ply_index < self.history.len() {
            self.history.truncate(self.ply_index);
        }
        self.history.push(record);
        self.ply_index += 1;
        self.current = next;
        self.selection = None;
        self.evaluation = None;
        Ok(self.snapshot())
    }

    /// Single-click interaction. First click on an occupied square selects
    /// it; a second click treats the square as a move target and clears the
    /// selection whatever the outcome.
    pub fn select_square(
        &mut self,
        square: Square,
    ) -> Result<(SessionSnapshot, ClickOutcome), SessionError> {
        match self.selection {
            None => {
                if self.current.is_occupied(square) {
                    self.selection = Some(square);
                    Ok((self.snapshot(), ClickOutcome::Selected))
                } else {
                    Ok((self.snapshot(), ClickOutcome::Ignored))
                }
            }
            Some(selected) => {
                let attempt = self.apply_move(selected, square, None);
                self.selection = None;
                match attempt {
                    Ok(_) => Ok((self.snapshot(), ClickOutcome::Moved)),
                    Err(err) => Err(err),
                }
            }
        }
    }

    pub fn clear_selection(&mut self) -> SessionSnapshot {
        self.selection = None;
        self.snapshot()
    }

    /// Step back one ply by replaying the immutable history prefix from the
    /// initial position. The history itself is never mutated here.
    pub fn apply_undo(&mut self) -> Result<SessionSnapshot, SessionError> {
        if self.ply_index == 0 {
            return Err(SessionError::NothingToUndo);
        }
        let target = self.ply_index - 1;
        let replayed = self
            .initial
            .replay(&self.history[..target])
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        self.current = replayed;
        self.ply_index = target;
        self.selection = None;
        self.evaluation = None;
        Ok(self.snapshot())
    }

    /// Step forward one ply by re-applying the recorded move.
    pub fn apply_redo(&mut self) -> Result<SessionSnapshot, SessionError> {
        if self.ply_index >= self.history.len() {
            return Err(SessionError::NothingToRedo);
        }
        let mv = self.history[self.ply_index].mv;
        let (next, _) = self
            .current
            .apply_move(mv)
            .map_err(|e| SessionError::Internal(e.to_string()))?;
        self.current = next;
        self.ply_index += 1;
        self.selection = None;
        self.evaluation = None;
        Ok(self.snapshot())
    }

    /// Reinitialize to the standard starting position.
    pub fn apply_reset(&mut self) -> SessionSnapshot {
        self.initial = Position::standard();
        self.current = Position::standard();
        self.history.clear();
        self.ply_index = 0;
        self.selection = None;
        self.metadata = None;
        self.evaluation = None;
        self.snapshot()
    }

    /// Replace the session with a parsed PGN game, positioned at its final
    /// ply. Parse failure leaves the session untouched.
    pub fn apply_load_pgn(&mut self, text: &str) -> Result<SessionSnapshot, SessionError> {
        let game = chess::parse_pgn(text).map_err(|e| SessionError::PgnParse(e.to_string()))?;
        let current = game
            .initial
            .replay(&game.moves)
            .map_err(|e| SessionError::Internal(e.to_string()))?;

        self.ply_index = game.moves.len();
        self.history = game.moves;
        self.initial = game.initial;
        self.current = current;
        self.metadata = Some(game.headers);
        self.selection = None;
        self.evaluation = None;
        Ok(self.snapshot())
    }

    /// Play the accepted evaluation's best move, if it still applies to the
    /// position it was computed for.
    pub fn play_best_move(&mut self) -> Result<SessionSnapshot, SessionError> {
        let evaluation = self.evaluation.as_ref().ok_or(SessionError::NoEvaluation)?;
        let best = evaluation
            .summary
            .best_move
            .as_deref()
            .ok_or(SessionError::NoBestMove)?;
        if evaluation.for_ply != self.ply_index {
            return Err(SessionError::StaleBestMove);
        }

        let (from, to, promotion) =
            parse_coordinate_move(best).map_err(|e| SessionError::Internal(e.to_string()))?;
        self.apply_move(from, to, promotion)
    }

    /// Allocate a request id for an evaluation of the current position and
    /// mark it pending. Any previously pending id is superseded.
    pub fn begin_evaluation(&mut self) -> (u64, String) {
        self.eval_seq += 1;
        self.pending_eval = Some(self.eval_seq);
        (self.eval_seq, self.current.to_fen())
    }

    /// Adopt an evaluation response. Returns false (and changes nothing) when
    /// the id no longer matches the pending request: a newer transition has
    /// superseded it.
    pub fn accept_evaluation(&mut self, request_id: u64, summary: EvalSummary) -> bool {
        if self.pending_eval != Some(request_id) {
            return false;
        }
        self.pending_eval = None;
        self.evaluation = Some(Evaluation {
            summary,
            for_ply: self.ply_index,
        });
        true
    }

    /// Mark the pending evaluation failed. Returns false when the id is stale.
    pub fn fail_evaluation(&mut self, request_id: u64) -> bool {
        if self.pending_eval != Some(request_id) {
            return false;
        }
        self.pending_eval = None;
        self.evaluation = None;
        true
    }
}
