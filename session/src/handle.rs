use cozy_chess::{Piece, Square};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{ClickOutcome, SessionCommand, SessionError};
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

/// Cheap, cloneable handle to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { cmd_tx }
    }

    pub async fn make_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::MakeMove {
            from,
            to,
            promotion,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn select_square(
        &self,
        square: Square,
    ) -> Result<(SessionSnapshot, ClickOutcome), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SelectSquare { square, reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn clear_selection(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::ClearSelection { reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn undo(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Undo { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn redo(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Redo { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn reset(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Reset { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn load_pgn(&self, text: String) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::LoadPgn { text, reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn play_best_move(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::PlayBestMove { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn get_snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Subscribe { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Internal("Session actor closed".into()))
    }
}
