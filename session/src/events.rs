use super::snapshot::SessionSnapshot;

/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Full state snapshot after any mutation, including evaluation arrival.
    StateChanged(SessionSnapshot),
    /// The in-flight evaluation failed or timed out; the session continues
    /// without one.
    EvaluationFailed(String),
}
