use cozy_chess::{Piece, Square};
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("PGN parse failed: {0}")]
    PgnParse(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("No evaluation available yet")]
    NoEvaluation,
    #[error("Evaluation carries no best move")]
    NoBestMove,
    #[error("Best move no longer applies to the current position")]
    StaleBestMove,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// What a single-click on a square resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A piece was selected; highlights now show its legal targets.
    Selected,
    /// Click on an empty square with nothing selected; no state change.
    Ignored,
    /// The click completed a move from the previously selected square.
    Moved,
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub enum SessionCommand {
    MakeMove {
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    SelectSquare {
        square: Square,
        reply: oneshot::Sender<Result<(SessionSnapshot, ClickOutcome), SessionError>>,
    },
    ClearSelection {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Undo {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    Redo {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    Reset {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    LoadPgn {
        text: String,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    PlayBestMove {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    Shutdown,
}
