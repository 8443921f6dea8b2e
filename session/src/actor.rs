use std::sync::Arc;

use evaluation::{parse_report, EvalError, EvalSummary, EvaluationService};
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::Instrument;

use super::commands::{ClickOutcome, SessionCommand};
use super::events::SessionEvent;
use super::state::SessionState;
use super::SessionConfig;

/// Completed evaluation attempt, tagged with the request id it was issued
/// under. The actor decides whether the id is still current.
struct EvalOutcome {
    request_id: u64,
    result: Result<String, EvalError>,
}

/// The main session actor loop.
/// Owns all mutable state. Processes commands and evaluation outcomes
/// sequentially, so no fence check can race a position change.
pub(crate) async fn run_session_actor(
    state: SessionState,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    service: Arc<dyn EvaluationService>,
    config: SessionConfig,
) {
    let session_id = state.session_id.clone();
    run_session_actor_inner(state, cmd_rx, event_tx, service, config)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    service: Arc<dyn EvaluationService>,
    config: SessionConfig,
) {
    tracing::info!("Session actor started");

    let (eval_tx, mut eval_rx) = mpsc::channel::<EvalOutcome>(16);

    // Evaluate the starting position right away.
    issue_evaluation(&mut state, &service, &config, &eval_tx);

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        tracing::info!("Session actor shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_command(&mut state, cmd, &event_tx, &service, &config, &eval_tx);
                    }
                }
            }

            Some(outcome) = eval_rx.recv() => {
                handle_eval_outcome(&mut state, outcome, &event_tx);
            }
        }
    }

    tracing::info!("Session actor exited");
}

fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    event_tx: &broadcast::Sender<SessionEvent>,
    service: &Arc<dyn EvaluationService>,
    config: &SessionConfig,
    eval_tx: &mpsc::Sender<EvalOutcome>,
) {
    match cmd {
        SessionCommand::MakeMove {
            from,
            to,
            promotion,
            reply,
        } => {
            let mut result = state.apply_move(from, to, promotion);
            if result.is_ok() {
                issue_evaluation(state, service, config, eval_tx);
                result = Ok(state.snapshot());
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(result);
        }
        SessionCommand::SelectSquare { square, reply } => {
            let result = match state.select_square(square) {
                Ok((_, outcome)) => {
                    if outcome == ClickOutcome::Moved {
                        issue_evaluation(state, service, config, eval_tx);
                    }
                    if outcome != ClickOutcome::Ignored {
                        let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
                    }
                    Ok((state.snapshot(), outcome))
                }
                Err(err) => {
                    // A failed move attempt still cleared the selection;
                    // subscribers must not keep rendering it.
                    let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
                    Err(err)
                }
            };
            let _ = reply.send(result);
        }
        SessionCommand::ClearSelection { reply } => {
            let snapshot = state.clear_selection();
            let _ = event_tx.send(SessionEvent::StateChanged(snapshot.clone()));
            let _ = reply.send(snapshot);
        }
        SessionCommand::Undo { reply } => {
            let mut result = state.apply_undo();
            if result.is_ok() {
                issue_evaluation(state, service, config, eval_tx);
                result = Ok(state.snapshot());
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(result);
        }
        SessionCommand::Redo { reply } => {
            let mut result = state.apply_redo();
            if result.is_ok() {
                issue_evaluation(state, service, config, eval_tx);
                result = Ok(state.snapshot());
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(result);
        }
        SessionCommand::Reset { reply } => {
            state.apply_reset();
            issue_evaluation(state, service, config, eval_tx);
            let snapshot = state.snapshot();
            let _ = event_tx.send(SessionEvent::StateChanged(snapshot.clone()));
            let _ = reply.send(snapshot);
        }
        SessionCommand::LoadPgn { text, reply } => {
            let mut result = state.apply_load_pgn(&text);
            if result.is_ok() {
                issue_evaluation(state, service, config, eval_tx);
                result = Ok(state.snapshot());
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(result);
        }
        SessionCommand::PlayBestMove { reply } => {
            let mut result = state.play_best_move();
            if result.is_ok() {
                issue_evaluation(state, service, config, eval_tx);
                result = Ok(state.snapshot());
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            }
            let _ = reply.send(result);
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::Subscribe { reply } => {
            let snapshot = state.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        SessionCommand::Shutdown => unreachable!(),
    }
}

/// Allocate a fresh request id for the current position and spawn the request
/// off-actor. The outcome comes back through `eval_tx` carrying the id; only
/// the id that is still pending when it arrives is allowed to land.
fn issue_evaluation(
    state: &mut SessionState,
    service: &Arc<dyn EvaluationService>,
    config: &SessionConfig,
    eval_tx: &mpsc::Sender<EvalOutcome>,
) {
    let (request_id, fen) = state.begin_evaluation();
    let service = Arc::clone(service);
    let eval_tx = eval_tx.clone();
    let timeout = config.eval_timeout;
    tokio::spawn(async move {
        let result = match time::timeout(timeout, service.evaluate(&fen)).await {
            Ok(result) => result,
            Err(_) => Err(EvalError::Timeout),
        };
        let _ = eval_tx.send(EvalOutcome { request_id, result }).await;
    });
}

fn handle_eval_outcome(
    state: &mut SessionState,
    outcome: EvalOutcome,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match outcome.result {
        Ok(raw) => {
            let summary = EvalSummary::from_report(&parse_report(&raw));
            if state.accept_evaluation(outcome.request_id, summary) {
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            } else {
                tracing::debug!(
                    request_id = outcome.request_id,
                    "Discarding stale evaluation response"
                );
            }
        }
        Err(err) => {
            if state.fail_evaluation(outcome.request_id) {
                tracing::warn!("Evaluation failed: {}", err);
                let _ = event_tx.send(SessionEvent::EvaluationFailed(err.to_string()));
                let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
            } else {
                tracing::debug!(
                    request_id = outcome.request_id,
                    "Ignoring failure of a superseded evaluation"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chess::parse_square;
    use cozy_chess::Square;
    use tokio::sync::oneshot;

    use crate::commands::SessionError;
    use crate::handle::SessionHandle;
    use crate::snapshot::SessionSnapshot;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    /// Returns the same report for every position, immediately.
    struct InstantService {
        raw: String,
    }

    #[async_trait]
    impl EvaluationService for InstantService {
        async fn evaluate(&self, _fen: &str) -> Result<String, EvalError> {
            Ok(self.raw.clone())
        }
    }

    /// Resolves each request when the test fires the oneshot scripted for its
    /// FEN, so tests control the order responses arrive in.
    struct ScriptedService {
        scripts: Mutex<HashMap<String, oneshot::Receiver<Result<String, EvalError>>>>,
    }

    impl ScriptedService {
        fn new() -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
            }
        }

        fn script(&self, fen: &str) -> oneshot::Sender<Result<String, EvalError>> {
            let (tx, rx) = oneshot::channel();
            self.scripts.lock().unwrap().insert(fen.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl EvaluationService for ScriptedService {
        async fn evaluate(&self, fen: &str) -> Result<String, EvalError> {
            let rx = self.scripts.lock().unwrap().remove(fen);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or(Err(EvalError::Transport("script dropped".into()))),
                None => Err(EvalError::Transport(format!("no script for {fen}"))),
            }
        }
    }

    fn spawn_test_actor(
        service: Arc<dyn EvaluationService>,
        config: SessionConfig,
    ) -> (SessionHandle, broadcast::Receiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = broadcast::channel(100);
        let state = SessionState::new("test".to_string());
        tokio::spawn(run_session_actor(state, cmd_rx, event_tx, service, config));
        (SessionHandle::new(cmd_tx), event_rx)
    }

    fn sq(s: &str) -> Square {
        parse_square(s).unwrap()
    }

    /// Drain events until a snapshot with an accepted evaluation arrives.
    async fn wait_for_evaluation(
        events: &mut broadcast::Receiver<SessionEvent>,
    ) -> SessionSnapshot {
        let wait = async {
            loop {
                if let SessionEvent::StateChanged(snap) = events.recv().await.unwrap() {
                    if snap.evaluation.is_some() {
                        return snap;
                    }
                }
            }
        };
        time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("no evaluation arrived")
    }

    async fn wait_for_failure(events: &mut broadcast::Receiver<SessionEvent>) -> String {
        let wait = async {
            loop {
                if let SessionEvent::EvaluationFailed(reason) = events.recv().await.unwrap() {
                    return reason;
                }
            }
        };
        time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("no failure event arrived")
    }

    #[tokio::test]
    async fn test_initial_position_is_evaluated() {
        let service = Arc::new(InstantService {
            raw: "info depth 20 score cp 28 pv e2e4\nbestmove e2e4".to_string(),
        });
        let (_handle, mut events) = spawn_test_actor(service, SessionConfig::default());

        let snap = wait_for_evaluation(&mut events).await;
        let evaluation = snap.evaluation.unwrap();
        assert_eq!(evaluation.white_advantage_percent, 52.8);
        assert!(!snap.evaluating);
        let arrow = snap.best_move_arrow.unwrap();
        assert_eq!((arrow.from.as_str(), arrow.to.as_str()), ("e2", "e4"));
    }

    #[tokio::test]
    async fn test_move_triggers_fresh_evaluation() {
        let service = Arc::new(InstantService {
            raw: "score cp 10 bestmove e7e5".to_string(),
        });
        let (handle, mut events) = spawn_test_actor(service, SessionConfig::default());

        let snap = handle.make_move(sq("e2"), sq("e4"), None).await.unwrap();
        assert_eq!(snap.ply_index, 1);
        assert!(snap.evaluating);
        assert!(snap.evaluation.is_none());

        // The post-move evaluation lands eventually.
        loop {
            let snap = wait_for_evaluation(&mut events).await;
            if snap.ply_index == 1 {
                assert!(!snap.evaluating);
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        // Resolve the post-move request first, then the starting-position
        // request. The late response for the old position must not clobber
        // the newer one.
        let service = Arc::new(ScriptedService::new());
        let first = service.script(START_FEN);
        let second = service.script(AFTER_E4_FEN);

        let (handle, mut events) =
            spawn_test_actor(service.clone(), SessionConfig::default());

        handle.make_move(sq("e2"), sq("e4"), None).await.unwrap();

        second
            .send(Ok("score cp -40 bestmove e7e5".to_string()))
            .unwrap();
        let snap = wait_for_evaluation(&mut events).await;
        assert_eq!(snap.evaluation.unwrap().white_advantage_percent, 46.0);

        first
            .send(Ok("score cp 500 bestmove a2a3".to_string()))
            .unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let snap = handle.get_snapshot().await.unwrap();
        let evaluation = snap.evaluation.unwrap();
        assert_eq!(evaluation.white_advantage_percent, 46.0);
        assert_eq!(evaluation.best_move.as_deref(), Some("e7e5"));
        assert!(!snap.evaluating);
    }

    #[tokio::test]
    async fn test_evaluation_timeout_marks_failure() {
        let service = Arc::new(ScriptedService::new());
        // Keep the sender alive so the request hangs until the timeout fires.
        let _pending = service.script(START_FEN);

        let config = SessionConfig {
            eval_timeout: Duration::from_millis(50),
        };
        let (handle, mut events) = spawn_test_actor(service.clone(), config);

        let reason = wait_for_failure(&mut events).await;
        assert!(reason.contains("timed out"), "unexpected reason: {reason}");

        let snap = handle.get_snapshot().await.unwrap();
        assert!(!snap.evaluating);
        assert!(snap.evaluation.is_none());
    }

    #[tokio::test]
    async fn test_service_error_leaves_session_usable() {
        let service = Arc::new(ScriptedService::new());
        let first = service.script(START_FEN);
        first.send(Err(EvalError::Status(500))).unwrap();

        let (handle, mut events) = spawn_test_actor(service.clone(), SessionConfig::default());
        wait_for_failure(&mut events).await;

        // Moves still work after a failed evaluation.
        let _after_move = service.script(AFTER_E4_FEN);
        let snap = handle.make_move(sq("e2"), sq("e4"), None).await.unwrap();
        assert_eq!(snap.ply_index, 1);
    }

    #[tokio::test]
    async fn test_click_to_move_via_actor() {
        let service = Arc::new(InstantService {
            raw: "score cp 0 bestmove e7e5".to_string(),
        });
        let (handle, _events) = spawn_test_actor(service, SessionConfig::default());

        let (snap, outcome) = handle.select_square(sq("g1")).await.unwrap();
        assert_eq!(outcome, ClickOutcome::Selected);
        assert_eq!(snap.selection.as_deref(), Some("g1"));

        let (snap, outcome) = handle.select_square(sq("f3")).await.unwrap();
        assert_eq!(outcome, ClickOutcome::Moved);
        assert_eq!(snap.ply_index, 1);
        assert!(snap.selection.is_none());
        assert!(snap.evaluating);
    }

    #[tokio::test]
    async fn test_illegal_click_broadcasts_cleared_selection() {
        // Keep the evaluation hanging so the only events are click-driven.
        let service = Arc::new(ScriptedService::new());
        let _pending = service.script(START_FEN);
        let (handle, mut events) = spawn_test_actor(service.clone(), SessionConfig::default());

        handle.select_square(sq("e2")).await.unwrap();
        let err = handle.select_square(sq("e5")).await.unwrap_err();
        assert!(matches!(err, SessionError::IllegalMove(_)));

        let wait = async {
            let SessionEvent::StateChanged(snap) = events.recv().await.unwrap() else {
                panic!("expected selection event");
            };
            assert_eq!(snap.selection.as_deref(), Some("e2"));

            let SessionEvent::StateChanged(snap) = events.recv().await.unwrap() else {
                panic!("expected cleared-selection event");
            };
            snap
        };
        let snap = time::timeout(Duration::from_secs(2), wait)
            .await
            .expect("no event after illegal click");
        assert!(snap.selection.is_none());
        assert!(snap.highlights.is_empty());
        assert_eq!(snap.ply_index, 0);
    }

    #[tokio::test]
    async fn test_undo_redo_via_actor() {
        let service = Arc::new(InstantService {
            raw: "score cp 0".to_string(),
        });
        let (handle, _events) = spawn_test_actor(service, SessionConfig::default());

        handle.make_move(sq("e2"), sq("e4"), None).await.unwrap();
        let snap = handle.undo().await.unwrap();
        assert_eq!(snap.ply_index, 0);
        assert!(snap.can_redo);

        let snap = handle.redo().await.unwrap();
        assert_eq!(snap.ply_index, 1);
        assert!(!snap.can_redo);
    }

    #[tokio::test]
    async fn test_load_pgn_via_actor() {
        let service = Arc::new(InstantService {
            raw: "score cp 0".to_string(),
        });
        let (handle, _events) = spawn_test_actor(service, SessionConfig::default());

        let snap = handle
            .load_pgn("[Event \"Test\"]\n\n1. e4 e5 *".to_string())
            .await
            .unwrap();
        assert_eq!(snap.history.len(), 2);
        assert_eq!(snap.ply_index, 2);
        assert_eq!(snap.metadata.unwrap().event, "Test");
    }

    #[tokio::test]
    async fn test_play_best_move_via_actor() {
        let service = Arc::new(InstantService {
            raw: "score cp 30 bestmove e2e4".to_string(),
        });
        let (handle, mut events) = spawn_test_actor(service, SessionConfig::default());
        wait_for_evaluation(&mut events).await;

        let snap = handle.play_best_move().await.unwrap();
        assert_eq!(snap.ply_index, 1);
        assert_eq!(snap.history[0].san, "e4");
        assert_eq!(snap.fen, AFTER_E4_FEN);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let service = Arc::new(InstantService {
            raw: "score cp 0".to_string(),
        });
        let (handle, _events) = spawn_test_actor(service, SessionConfig::default());
        handle.shutdown().await;
        assert!(handle.make_move(sq("e2"), sq("e4"), None).await.is_err());
    }
}
