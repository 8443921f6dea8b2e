//! HTTP client for the engine evaluation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{EvalError, EvaluationService};

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    fen: &'a str,
}

#[derive(Deserialize)]
struct EvaluateResponse {
    evaluation: String,
}

/// Client for `POST {base_url}/evaluate` with body `{"fen": "..."}`.
pub struct HttpEvalClient {
    client: Client,
    base_url: String,
}

impl HttpEvalClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EvalError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EvalError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EvaluationService for HttpEvalClient {
    async fn evaluate(&self, fen: &str) -> Result<String, EvalError> {
        let url = format!("{}/evaluate", self.base_url);
        tracing::debug!(%url, %fen, "requesting evaluation");

        let response = self
            .client
            .post(&url)
            .json(&EvaluateRequest { fen })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvalError::Timeout
                } else {
                    EvalError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EvalError::Status(response.status().as_u16()));
        }

        let body: EvaluateResponse = response
            .json()
            .await
            .map_err(|e| EvalError::InvalidResponse(e.to_string()))?;
        Ok(body.evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = HttpEvalClient::new("http://localhost:5001/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:5001");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_string(&EvaluateRequest { fen: "8/8 w - - 0 1" }).unwrap();
        assert_eq!(body, r#"{"fen":"8/8 w - - 0 1"}"#);
    }

    #[test]
    fn test_response_body_shape() {
        let parsed: EvaluateResponse =
            serde_json::from_str(r#"{"evaluation":"bestmove e2e4"}"#).unwrap();
        assert_eq!(parsed.evaluation, "bestmove e2e4");
    }
}
