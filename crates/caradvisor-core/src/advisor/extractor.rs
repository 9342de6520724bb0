//! Filter extraction via LLM.
//!
//! `FilterExtractor` asks the model to turn a free-form request ("a red car
//! under 20000") into a structured [`FilterSet`]. The reply is parsed
//! leniently: entries the catalog cannot evaluate are dropped with a warning,
//! and a reply that is not JSON at all means "no filters".
//!
//! Transport failures and timeouts are not swallowed; they surface as
//! [`LlmError`] and fail the chat request.

use std::sync::Arc;

use serde_json::Value;

use caradvisor_types::chat::ConversationHistory;
use caradvisor_types::filter::FilterSet;
use caradvisor_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::provider::LlmProvider;
use crate::llm::{LlmSettings, complete_with_timeout};

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a car advisor assistant. Extract search filters from the user's latest message, using the earlier conversation only to resolve references like "something cheaper" or "the same but in blue".

Return ONLY a JSON object. Every key is optional:
- "brand" (string)
- "model" (string)
- "color" (string)
- "fuel_type" (one of "petrol", "diesel", "electric", "hybrid", "plug_in_hybrid")
- "transmission" (one of "manual", "automatic")
- "price" (object with "min" and/or "max", in euros)
- "seats" (number 2-9, or an object with "min" and/or "max")
- "year" (number, or an object with "min" and/or "max")
- "doors" (number 2-5)

A list of values means "any of these", e.g. {"fuel_type": ["hybrid", "electric"]}.
If the user does not mention a criterion, leave the key out.

Examples:
User: "I want an electric car under 35000"
Response: {"fuel_type": "electric", "price": {"max": 35000}}

User: "I want a red car under 20000"
Response: {"color": "red", "price": {"max": 20000}}

User: "Show me automatic cars with at least 5 seats"
Response: {"transmission": "automatic", "seats": {"min": 5}}

User: "I need a family car"
Response: {"seats": {"min": 5}}

User: "Hello, I'm looking for a car"
Response: {}"#;

/// Turns user messages into filter sets with one LLM call each.
pub struct FilterExtractor<L: LlmProvider> {
    llm: Arc<L>,
    settings: LlmSettings,
}

impl<L: LlmProvider> FilterExtractor<L> {
    pub fn new(llm: Arc<L>, settings: LlmSettings) -> Self {
        Self { llm, settings }
    }

    /// Extract filters from `message`, with `history` as context.
    ///
    /// No retries. The call is bounded by the configured LLM timeout.
    #[tracing::instrument(
        name = "extract_filters",
        skip(self, message, history),
        fields(history_turns = history.len())
    )]
    pub async fn extract(
        &self,
        message: &str,
        history: &ConversationHistory,
    ) -> Result<FilterSet, LlmError> {
        let mut messages = history.to_messages();
        messages.push(Message::user(message));

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
            max_tokens: 300,
            temperature: Some(0.1),
            json_mode: true,
        };

        let response = complete_with_timeout(self.llm.as_ref(), &request, self.settings.timeout).await?;
        let filters = parse_extraction(&response.content);
        tracing::debug!(extracted = filters.len(), "Filters extracted");
        Ok(filters)
    }
}

/// Parse the model's reply into a filter set, dropping whatever is unusable.
pub fn parse_extraction(raw: &str) -> FilterSet {
    let body = strip_code_fence(raw);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                error = %e,
                content_preview = %body.chars().take(200).collect::<String>(),
                "Failed to parse filter extraction JSON; using no filters"
            );
            return FilterSet::new();
        }
    };

    let (filters, dropped) = FilterSet::parse_lenient(&value);
    for err in dropped {
        tracing::warn!(error = %err, "Dropping extracted filter");
    }
    filters
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string ("json") up to the end of the opening line.
    let rest = rest.find('\n').map_or("", |i| &rest[i + 1..]);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use caradvisor_types::car::FuelType;
    use caradvisor_types::chat::ConversationTurn;
    use caradvisor_types::filter::{CarAttribute, Constraint};

    use crate::testing::ScriptedLlm;

    fn extractor(llm: ScriptedLlm) -> FilterExtractor<ScriptedLlm> {
        FilterExtractor::new(
            Arc::new(llm),
            LlmSettings {
                model: "test-model".to_string(),
                timeout: Duration::from_secs(1),
            },
        )
    }

    #[tokio::test]
    async fn test_red_car_under_20000() {
        let llm = ScriptedLlm::new([r#"{"color": "red", "price": {"max": 20000}}"#]);
        let filters = extractor(llm)
            .extract("I want a red car under 20000", &ConversationHistory::new())
            .await
            .unwrap();

        let expected = FilterSet::new()
            .with(CarAttribute::Color, Constraint::text("red"))
            .with(CarAttribute::Price, Constraint::max(20_000.0));
        assert_eq!(filters, expected);
    }

    #[tokio::test]
    async fn test_request_carries_history_and_settings() {
        let llm = ScriptedLlm::new(["{}"]);
        let history = ConversationHistory::from_turns(vec![ConversationTurn {
            user: "an electric car".to_string(),
            assistant: "Here are 3 options".to_string(),
        }]);
        extractor(llm.clone())
            .extract("something cheaper", &history)
            .await
            .unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.1));
        assert!(request.json_mode);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[2], Message::user("something cheaper"));
        assert!(request.system.as_deref().unwrap().contains("fuel_type"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_means_no_filters() {
        let llm = ScriptedLlm::new(["Sure! You want something sporty."]);
        let filters = extractor(llm)
            .extract("something sporty", &ConversationHistory::new())
            .await
            .unwrap();
        assert!(filters.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let llm = ScriptedLlm::from_results([Err(LlmError::RateLimited)]);
        let err = extractor(llm)
            .extract("a diesel", &ConversationHistory::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited));
    }

    #[tokio::test]
    async fn test_timeout_propagates() {
        let llm = ScriptedLlm::new(["{}"]).with_delay(Duration::from_secs(5));
        let extractor = FilterExtractor::new(
            Arc::new(llm),
            LlmSettings {
                model: String::new(),
                timeout: Duration::from_millis(20),
            },
        );
        let err = extractor
            .extract("a diesel", &ConversationHistory::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let raw = "```json\n{\"fuel_type\": \"electric\"}\n```";
        let filters = parse_extraction(raw);
        assert_eq!(
            filters.get(CarAttribute::FuelType),
            Some(&Constraint::fuel(FuelType::Electric))
        );
    }

    #[test]
    fn test_parse_legacy_keys() {
        let filters = parse_extraction(r#"{"max_price": 30000, "min_seats": 5, "brand": null}"#);
        assert_eq!(filters.get(CarAttribute::Price), Some(&Constraint::max(30_000.0)));
        assert_eq!(filters.get(CarAttribute::Seats), Some(&Constraint::min(5.0)));
        assert!(!filters.contains(CarAttribute::Brand));
    }

    #[test]
    fn test_parse_drops_invalid_entries() {
        let filters = parse_extraction(r#"{"fuel_type": "steam", "wings": 2, "color": "blue"}"#);
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get(CarAttribute::Color), Some(&Constraint::text("blue")));
    }

    #[test]
    fn test_parse_non_object_is_empty() {
        assert!(parse_extraction("[1, 2, 3]").is_empty());
    }

    #[test]
    fn test_strip_code_fence_plain() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }
}
