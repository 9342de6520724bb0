//! Configuration for the OpenAI-compatible provider.
//!
//! Any endpoint speaking the OpenAI chat completions protocol works; the base
//! URL decides which vendor answers.

use secrecy::SecretString;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request does not name one.
    pub model: String,
}

/// Name a provider after its endpoint so logs say who answered.
pub fn provider_name_for(base_url: &str) -> String {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    match host {
        "api.openai.com" => "openai".to_string(),
        "api.mistral.ai" => "mistral".to_string(),
        "generativelanguage.googleapis.com" => "gemini".to_string(),
        "" => "openai-compatible".to_string(),
        other => other.to_string(),
    }
}
