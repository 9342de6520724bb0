//! The chat pipeline: extract, combine, query, summarize.

use std::sync::Arc;

use uuid::Uuid;

use caradvisor_types::chat::{ChatReply, ChatRequest};
use caradvisor_types::error::AdvisorError;

use crate::llm::LlmSettings;
use crate::llm::provider::LlmProvider;
use crate::repository::car::CarRepository;

use super::combine::combine_filters;
use super::extractor::FilterExtractor;
use super::heuristics::{detect_user_satisfaction, priority_columns};
use super::responder::{MAX_CARS_SHOWN, ResponseGenerator, SummaryInput};

/// Runs one chat message through the advisor pipeline.
///
/// Stateless between calls: the conversation history comes in with the
/// request and goes back out with the reply.
pub struct AdvisorService<R: CarRepository, L: LlmProvider> {
    repo: Arc<R>,
    extractor: FilterExtractor<L>,
    responder: ResponseGenerator<L>,
    max_history_turns: usize,
}

impl<R: CarRepository, L: LlmProvider> AdvisorService<R, L> {
    pub fn new(repo: Arc<R>, llm: Arc<L>, settings: LlmSettings, max_history_turns: usize) -> Self {
        Self {
            repo,
            extractor: FilterExtractor::new(Arc::clone(&llm), settings.clone()),
            responder: ResponseGenerator::new(llm, settings, max_history_turns),
            max_history_turns,
        }
    }

    /// Answer a chat message.
    ///
    /// Extraction and catalog failures fail the call. A failed summary after a
    /// successful query yields a degraded reply that still carries the cars.
    #[tracing::instrument(name = "chat", skip(self, request), fields(conversation_id))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, AdvisorError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AdvisorError::Validation("message cannot be empty".to_string()));
        }

        let conversation_id = request.conversation_id.unwrap_or_else(Uuid::now_v7);
        tracing::Span::current().record("conversation_id", tracing::field::display(conversation_id));

        let manual = request.active_filters.unwrap_or_default();
        let mut history = request.history;
        history.truncate_to_recent(self.max_history_turns);

        let extracted = self.extractor.extract(message, &history).await?;
        let applied = combine_filters(&manual, &extracted);

        let cars = self.repo.find(&applied).await?;
        tracing::info!(
            manual = manual.len(),
            extracted = extracted.len(),
            cars_found = cars.len(),
            "Catalog queried"
        );

        let suggest_comparison = detect_user_satisfaction(message) && cars.len() >= 2;

        let input = SummaryInput {
            message,
            cars: &cars,
            filters: &applied,
            suggest_comparison,
            history: &history,
        };
        let (summary, degraded) = match self.responder.generate(input).await {
            Ok(summary) => (summary, false),
            Err(e) => {
                tracing::warn!(error = %e, "Summary generation failed; replying with fallback");
                (self.responder.fallback(message, &history), true)
            }
        };

        let priority_columns = priority_columns(&applied);
        let cars_found = cars.len();
        let cars = cars.into_iter().take(MAX_CARS_SHOWN).collect();

        Ok(ChatReply {
            conversation_id,
            message: summary.text,
            active_filters: manual,
            extracted_filters: extracted,
            filters_applied: applied,
            cars_found,
            cars,
            suggest_comparison,
            priority_columns,
            history: summary.history,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use caradvisor_types::car::{CarColumn, FuelType};
    use caradvisor_types::chat::{ConversationHistory, ConversationTurn};
    use caradvisor_types::filter::{CarAttribute, Constraint, FilterSet};
    use caradvisor_types::llm::LlmError;

    use crate::testing::{InMemoryCarRepository, ScriptedLlm, car, sample_catalog};

    fn service(
        repo: InMemoryCarRepository,
        llm: ScriptedLlm,
        max_history_turns: usize,
    ) -> AdvisorService<InMemoryCarRepository, ScriptedLlm> {
        AdvisorService::new(
            Arc::new(repo),
            Arc::new(llm),
            LlmSettings {
                model: "test-model".to_string(),
                timeout: Duration::from_secs(1),
            },
            max_history_turns,
        )
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            active_filters: None,
            conversation_id: None,
            history: ConversationHistory::new(),
        }
    }

    #[tokio::test]
    async fn test_red_car_under_20000() {
        let llm = ScriptedLlm::new([
            r#"{"color": "red", "price": {"max": 20000}}"#,
            "I found two red cars for you.",
        ]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);

        let reply = service.chat(request("I want a red car under 20000")).await.unwrap();

        assert_eq!(reply.cars_found, 2);
        assert!(reply.cars.iter().all(|c| c.color.eq_ignore_ascii_case("red") && c.price <= 20_000.0));
        assert_eq!(reply.extracted_filters, reply.filters_applied);
        assert!(reply.active_filters.is_empty());
        assert_eq!(reply.message, "I found two red cars for you.");
        assert!(!reply.suggest_comparison);
        assert!(!reply.degraded);
        assert_eq!(&reply.priority_columns[..4], &[
            CarColumn::Brand,
            CarColumn::Model,
            CarColumn::Price,
            CarColumn::Color,
        ]);
        assert_eq!(reply.history.len(), 1);
    }

    #[tokio::test]
    async fn test_manual_filter_overrides_extracted() {
        let llm = ScriptedLlm::new([r#"{"fuel_type": "diesel"}"#, "Electric options."]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);
        let mut req = request("show me a diesel");
        req.active_filters =
            Some(FilterSet::new().with(CarAttribute::FuelType, Constraint::fuel(FuelType::Electric)));

        let reply = service.chat(req).await.unwrap();

        assert_eq!(
            reply.filters_applied.get(CarAttribute::FuelType),
            Some(&Constraint::fuel(FuelType::Electric))
        );
        assert_eq!(
            reply.extracted_filters.get(CarAttribute::FuelType),
            Some(&Constraint::fuel(FuelType::Diesel))
        );
        assert_eq!(reply.cars_found, 2);
        assert!(reply.cars.iter().all(|c| c.fuel_type == FuelType::Electric));
    }

    #[tokio::test]
    async fn test_satisfied_user_gets_comparison_suggestion() {
        let llm = ScriptedLlm::new([r#"{"color": "red"}"#, "Want a comparison?"]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);
        let reply = service.chat(request("Perfect, red ones look good")).await.unwrap();
        assert!(reply.suggest_comparison);
    }

    #[tokio::test]
    async fn test_satisfied_with_single_match_no_suggestion() {
        let llm = ScriptedLlm::new([r#"{"brand": "Peugeot"}"#, "Just the one."]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);
        let reply = service.chat(request("thanks, only Peugeot")).await.unwrap();
        assert_eq!(reply.cars_found, 1);
        assert!(!reply.suggest_comparison);
    }

    #[tokio::test]
    async fn test_returns_at_most_five_cars() {
        let cars = (0..8)
            .map(|i| car("Dacia", &format!("Sandero {i}"), "grey", 11_000.0, FuelType::Petrol))
            .collect();
        let llm = ScriptedLlm::new(["{}", "Lots of Dacias."]);
        let service = service(InMemoryCarRepository::with_cars(cars), llm, 10);
        let reply = service.chat(request("anything")).await.unwrap();
        assert_eq!(reply.cars_found, 8);
        assert_eq!(reply.cars.len(), 5);
    }

    #[tokio::test]
    async fn test_history_grows_and_is_capped() {
        let llm = ScriptedLlm::new(["{}", "fourth answer"]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm.clone(), 3);
        let mut req = request("fourth question");
        req.history = ConversationHistory::from_turns(
            (1..=3)
                .map(|n| ConversationTurn {
                    user: format!("q{n}"),
                    assistant: format!("a{n}"),
                })
                .collect(),
        );
        let conversation_id = Uuid::now_v7();
        req.conversation_id = Some(conversation_id);

        let reply = service.chat(req).await.unwrap();

        assert_eq!(reply.conversation_id, conversation_id);
        assert_eq!(reply.history.len(), 3);
        assert_eq!(reply.history.turns()[0].user, "q2");
        assert_eq!(reply.history.turns()[2].assistant, "fourth answer");
        // Extractor prompt: 3 prior turns (6 messages) plus the new message.
        assert_eq!(llm.requests()[0].messages.len(), 7);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let llm = ScriptedLlm::new(Vec::<String>::new());
        let service = service(InMemoryCarRepository::default(), llm.clone(), 10);
        let err = service.chat(request("   ")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Validation(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_external_service_error() {
        let llm = ScriptedLlm::from_results([Err(LlmError::Overloaded("busy".to_string()))]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);
        let err = service.chat(request("a red car")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::ExternalService(_)));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_data_access_error() {
        let llm = ScriptedLlm::new(["{}"]);
        let service = service(InMemoryCarRepository::unavailable(), llm, 10);
        let err = service.chat(request("a red car")).await.unwrap_err();
        assert!(matches!(err, AdvisorError::DataAccess(_)));
    }

    #[tokio::test]
    async fn test_summary_failure_degrades() {
        let llm = ScriptedLlm::from_results([
            Ok(r#"{"color": "red"}"#.to_string()),
            Err(LlmError::RateLimited),
        ]);
        let service = service(InMemoryCarRepository::with_cars(sample_catalog()), llm, 10);
        let reply = service.chat(request("red cars")).await.unwrap();
        assert!(reply.degraded);
        assert_eq!(reply.cars_found, 3);
        assert_eq!(reply.history.len(), 1);
        assert_eq!(reply.message, crate::advisor::responder::FALLBACK_REPLY);
    }
}
