//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait defined
//! in `caradvisor-core` and a factory ([`create_provider`]) that builds it
//! from the `[llm]` configuration section.
//!
//! [`LlmProvider`]: caradvisor_core::llm::provider::LlmProvider

pub mod openai_compat;

use caradvisor_core::llm::box_provider::BoxLlmProvider;
use caradvisor_types::config::LlmSection;
use caradvisor_types::llm::LlmError;
use secrecy::{ExposeSecret, SecretString};

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, provider_name_for};

/// Create a [`BoxLlmProvider`] from the `[llm]` configuration section.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] when no API key is configured.
pub fn create_provider(config: &LlmSection) -> Result<BoxLlmProvider, LlmError> {
    let api_key = config
        .api_key
        .as_ref()
        .map(|key| SecretString::from(key.expose_secret().to_string()))
        .ok_or(LlmError::AuthenticationFailed)?;

    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
        provider_name: provider_name_for(&config.base_url),
        base_url: config.base_url.trim_end_matches('/').to_string(),
        api_key,
        model: config.model.clone(),
    });
    tracing::info!(
        provider = %provider_name_for(&config.base_url),
        model = %config.model,
        "LLM provider configured"
    );
    Ok(BoxLlmProvider::new(provider))
}
