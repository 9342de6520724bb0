//! LLM provider abstractions for Car Advisor.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - [`complete_with_timeout`]: bounds a completion call in time

pub mod box_provider;
pub mod provider;

use std::time::Duration;

use caradvisor_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use self::provider::LlmProvider;

/// Model and deadline applied to every completion the advisor issues.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Run a completion, failing with [`LlmError::Timeout`] past the deadline.
pub async fn complete_with_timeout<L: LlmProvider>(
    llm: &L,
    request: &CompletionRequest,
    timeout: Duration,
) -> Result<CompletionResponse, LlmError> {
    match tokio::time::timeout(timeout, llm.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages: Vec::new(),
            system: None,
            max_tokens: 10,
            temperature: None,
            json_mode: false,
        }
    }

    #[tokio::test]
    async fn test_timeout_elapses() {
        let llm = ScriptedLlm::new(["late"]).with_delay(Duration::from_millis(200));
        let err = complete_with_timeout(&llm, &request(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let llm = ScriptedLlm::new(["on time"]);
        let response = complete_with_timeout(&llm, &request(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.content, "on time");
    }
}
