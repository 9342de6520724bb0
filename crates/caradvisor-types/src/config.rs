//! Application configuration types for Car Advisor.
//!
//! `AppConfig` mirrors `caradvisor.toml`. Every field has a default so an
//! empty file (or no file) is valid; environment variables are layered on top
//! by the loader in `caradvisor-infra`.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Top-level configuration.
///
/// Not `Clone`: it holds the API secrets, which are handed out by reference.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub chat: ChatSection,
}

/// Service identity reported by `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_app_version")]
    pub version: String,
}

fn default_app_name() -> String {
    "Car Advisor API".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS (the web frontend).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Catalog store connection.
///
/// A `sqlite:` URL selects the embedded SQLite catalog; an `http(s)://` URL
/// selects a hosted PostgREST endpoint, which needs `key`.
#[derive(Debug, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub key: Option<SecretString>,
    #[serde(default = "default_database_timeout")]
    pub timeout_secs: u64,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .map(SecretString::from))
}

fn default_database_url() -> String {
    "sqlite://caradvisor.db?mode=rwc".to_string()
}

fn default_database_timeout() -> u64 {
    10
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            key: None,
            timeout_secs: default_database_timeout(),
        }
    }
}

/// Which catalog backend a database URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Rest,
}

impl DatabaseSection {
    pub fn backend(&self) -> Option<DatabaseBackend> {
        let url = self.url.trim();
        if url.starts_with("sqlite:") {
            Some(DatabaseBackend::Sqlite)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Some(DatabaseBackend::Rest)
        } else {
            None
        }
    }
}

/// OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Deserialize)]
pub struct LlmSection {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSection {
    /// Conversation turns kept in prompts and returned history.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_history_turns() -> usize {
    10
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.app.name, "Car Advisor API");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.cors_origins.len(), 4);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.chat.max_history_turns, 10);
        assert_eq!(config.database.backend(), Some(DatabaseBackend::Sqlite));
    }

    #[test]
    fn test_deserialize_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 9000

[database]
url = "https://project.supabase.co"
key = "service-key"

[llm]
api_key = "sk-test"
model = "gpt-4o"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.backend(), Some(DatabaseBackend::Rest));
        assert_eq!(
            config.database.key.as_ref().unwrap().expose_secret(),
            "service-key"
        );
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_unknown_backend() {
        let section = DatabaseSection {
            url: "mysql://localhost".to_string(),
            ..Default::default()
        };
        assert_eq!(section.backend(), None);
    }
}
