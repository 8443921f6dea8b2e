//! Client and parser for the external engine evaluation service.
//!
//! The service wraps a UCI engine behind `POST /evaluate`; it accepts a FEN
//! and returns the raw engine report text. Everything here is stateless: the
//! session core owns request ordering and staleness handling.

pub mod client;
pub mod report;

pub use client::HttpEvalClient;
pub use report::{parse_report, EvalReport, EvalSummary, Score};

use async_trait::async_trait;

/// Anything that can evaluate a position, returning the raw report text.
/// Abstracted so the session core can be driven by a scripted mock in tests.
#[async_trait]
pub trait EvaluationService: Send + Sync {
    async fn evaluate(&self, fen: &str) -> Result<String, EvalError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    #[error("Engine service request failed: {0}")]
    Transport(String),
    #[error("Engine service returned HTTP {0}")]
    Status(u16),
    #[error("Malformed engine service response: {0}")]
    InvalidResponse(String),
    #[error("Engine service timed out")]
    Timeout,
}
