//! Game session core: the single stateful orchestrator between the board
//! adapter, the evaluation service, and whatever presentation layer drives it.
//!
//! All mutable state lives inside one actor task; callers hold a cloneable
//! [`SessionHandle`] and receive immutable [`SessionSnapshot`]s, either as
//! command replies or over the broadcast event channel.

mod actor;
mod commands;
mod derive;
mod events;
mod handle;
mod snapshot;
mod state;

pub use commands::{ClickOutcome, SessionError};
pub use derive::{arrow_for, highlights_for};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::{Arrow, Highlight, HighlightKind, MoveView, SessionSnapshot};

use std::sync::Arc;
use std::time::Duration;

use evaluation::EvaluationService;
use tokio::sync::{broadcast, mpsc};

use state::SessionState;

/// Tuning for the evaluation side channel.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on a single evaluation request; a request that exceeds it
    /// is marked failed rather than left hanging.
    pub eval_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            eval_timeout: Duration::from_secs(5),
        }
    }
}

/// Spawn a session actor and return its handle plus an event subscription.
/// An evaluation of the starting position is requested immediately.
pub fn spawn_session(
    service: Arc<dyn EvaluationService>,
    config: SessionConfig,
) -> (SessionHandle, broadcast::Receiver<SessionEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = broadcast::channel(100);
    let state = SessionState::new(uuid::Uuid::new_v4().to_string());
    tokio::spawn(actor::run_session_actor(
        state, cmd_rx, event_tx, service, config,
    ));
    (SessionHandle::new(cmd_tx), event_rx)
}
