//! Prose answer generation over the matched cars.

use std::fmt::Write as _;
use std::sync::Arc;

use caradvisor_types::car::Car;
use caradvisor_types::chat::{ConversationHistory, ConversationTurn};
use caradvisor_types::filter::FilterSet;
use caradvisor_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::provider::LlmProvider;
use crate::llm::{LlmSettings, complete_with_timeout};

/// Cars described to the model and returned to the caller.
pub const MAX_CARS_SHOWN: usize = 5;

/// Reply used when the model fails after the catalog query succeeded.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I couldn't put together an answer just now. The matching cars are listed below; please try again in a moment.";

const RESPONDER_SYSTEM_PROMPT: &str = "You are a friendly and knowledgeable car advisor assistant.
Your job is to help users find the perfect car based on their needs.

Based on the cars found in the database, provide a helpful, natural response to the user.
- Be conversational and friendly
- Highlight the best matches first
- Mention key features that match their criteria
- If no cars match, suggest adjusting their criteria
- Keep responses concise but informative";

const COMPARISON_INSTRUCTION: &str = "IMPORTANT: End your response by asking if the user would like to compare these models in a detailed comparison table.";

/// What the generator needs to know about one chat turn.
pub struct SummaryInput<'a> {
    pub message: &'a str,
    /// All matches; only the first [`MAX_CARS_SHOWN`] are described.
    pub cars: &'a [Car],
    pub filters: &'a FilterSet,
    pub suggest_comparison: bool,
    pub history: &'a ConversationHistory,
}

/// The answer text and the history with this exchange appended.
#[derive(Debug, Clone)]
pub struct Summary {
    pub text: String,
    pub history: ConversationHistory,
}

pub struct ResponseGenerator<L: LlmProvider> {
    llm: Arc<L>,
    settings: LlmSettings,
    max_history_turns: usize,
}

impl<L: LlmProvider> ResponseGenerator<L> {
    pub fn new(llm: Arc<L>, settings: LlmSettings, max_history_turns: usize) -> Self {
        Self {
            llm,
            settings,
            max_history_turns,
        }
    }

    #[tracing::instrument(
        name = "generate_summary",
        skip(self, input),
        fields(cars = input.cars.len(), suggest_comparison = input.suggest_comparison)
    )]
    pub async fn generate(&self, input: SummaryInput<'_>) -> Result<Summary, LlmError> {
        let mut system = RESPONDER_SYSTEM_PROMPT.to_string();
        if input.suggest_comparison && input.cars.len() >= 2 {
            system.push_str("\n\n");
            system.push_str(COMPARISON_INSTRUCTION);
        }

        let mut messages = input.history.to_messages();
        messages.push(Message::user(build_user_prompt(&input)));

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            system: Some(system),
            max_tokens: 500,
            temperature: Some(0.7),
            json_mode: false,
        };

        let response = complete_with_timeout(self.llm.as_ref(), &request, self.settings.timeout).await?;
        let text = response.content.trim().to_string();
        let history = self.append(input.history, input.message, &text);
        Ok(Summary { text, history })
    }

    /// The fixed apology, recorded in history like a normal answer.
    pub fn fallback(&self, message: &str, history: &ConversationHistory) -> Summary {
        Summary {
            text: FALLBACK_REPLY.to_string(),
            history: self.append(history, message, FALLBACK_REPLY),
        }
    }

    fn append(&self, history: &ConversationHistory, user: &str, assistant: &str) -> ConversationHistory {
        let mut updated = history.clone();
        updated.push(
            ConversationTurn {
                user: user.to_string(),
                assistant: assistant.to_string(),
            },
            self.max_history_turns,
        );
        updated
    }
}

fn build_user_prompt(input: &SummaryInput<'_>) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "User's message: {}", input.message);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Applied filters: {}", input.filters);
    let _ = writeln!(prompt);

    if input.cars.is_empty() {
        let _ = writeln!(prompt, "No cars found matching the criteria.");
    } else {
        let _ = writeln!(prompt, "Found {} car(s):", input.cars.len());
        let _ = writeln!(prompt);
        for (i, car) in input.cars.iter().take(MAX_CARS_SHOWN).enumerate() {
            let _ = writeln!(prompt, "{}. {} {} ({})", i + 1, car.brand, car.model, car.year);
            let _ = writeln!(prompt, "   - Price: €{}", format_euros(car.price));
            let _ = writeln!(
                prompt,
                "   - Fuel: {}, Transmission: {}",
                car.fuel_type, car.transmission
            );
            let _ = writeln!(prompt, "   - Seats: {}, Doors: {}", car.seats, car.doors);
            let _ = writeln!(prompt, "   - Color: {}", car.color);
            let _ = writeln!(prompt);
        }
    }

    prompt.push_str("Provide a helpful response to the user.");
    prompt
}

/// Whole euros with comma thousands separators: 24990.4 -> "24,990".
fn format_euros(price: f64) -> String {
    let digits = (price.round() as i64).unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if price.round() < 0.0 {
        out.insert(0, '-');
    }
    out
}
