//! Configuration loader for Car Advisor.
//!
//! Reads `caradvisor.toml` (path given by `--config`), overlays environment
//! variables, then validates. A missing file is not an error: every setting
//! has a default or can come from the environment alone.

use std::path::{Path, PathBuf};

use caradvisor_types::config::{AppConfig, DatabaseBackend};
use secrecy::SecretString;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("unsupported DATABASE_URL '{0}': expected a sqlite: or http(s):// URL")]
    UnsupportedDatabase(String),

    #[error("{0} must be at least 1 second")]
    ZeroTimeout(&'static str),
}

/// Load, overlay the process environment, and validate.
///
/// `require_llm` is false for commands that only touch the catalog.
pub async fn load_config(path: &Path, require_llm: bool) -> Result<AppConfig, ConfigError> {
    let mut config = read_config_file(path).await?;
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate(&config, require_llm)?;
    Ok(config)
}

/// Parse the TOML file at `path`, or return defaults if it does not exist.
pub async fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<AppConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests do not mutate process state.
/// Empty values count as unset.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
    let first = |vars: &[&str]| vars.iter().find_map(|v| get(*v));

    if let Some(v) = get("APP_NAME") {
        config.app.name = v;
    }
    if let Some(v) = get("APP_VERSION") {
        config.app.version = v;
    }
    if let Some(v) = get("API_HOST") {
        config.server.host = v;
    }
    if let Some(v) = get("API_PORT") {
        config.server.port = parse_env("API_PORT", &v)?;
    }
    if let Some(v) = get("CORS_ORIGINS") {
        config.server.cors_origins = v
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(v) = first(&["DATABASE_URL", "SUPABASE_URL"]) {
        config.database.url = v;
    }
    if let Some(v) = first(&["DATABASE_KEY", "SUPABASE_SERVICE_KEY", "SUPABASE_ANON_KEY"]) {
        config.database.key = Some(SecretString::from(v));
    }
    if let Some(v) = get("DATABASE_TIMEOUT_SECS") {
        config.database.timeout_secs = parse_env("DATABASE_TIMEOUT_SECS", &v)?;
    }

    if let Some(v) = get("OPENAI_API_KEY") {
        config.llm.api_key = Some(SecretString::from(v));
    }
    if let Some(v) = get("LLM_BASE_URL") {
        config.llm.base_url = v;
    }
    if let Some(v) = get("LLM_MODEL") {
        config.llm.model = v;
    }
    if let Some(v) = get("LLM_TIMEOUT_SECS") {
        config.llm.timeout_secs = parse_env("LLM_TIMEOUT_SECS", &v)?;
    }

    if let Some(v) = get("MAX_HISTORY_TURNS") {
        config.chat.max_history_turns = parse_env("MAX_HISTORY_TURNS", &v)?;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

/// Check that every required setting is present, listing all that are not.
pub fn validate(config: &AppConfig, require_llm: bool) -> Result<(), ConfigError> {
    let mut missing = Vec::new();

    match config.database.backend() {
        Some(DatabaseBackend::Sqlite) => {}
        Some(DatabaseBackend::Rest) => {
            if config.database.key.is_none() {
                missing.push("DATABASE_KEY");
            }
        }
        None => return Err(ConfigError::UnsupportedDatabase(config.database.url.clone())),
    }

    if config.database.timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout("DATABASE_TIMEOUT_SECS"));
    }
    if config.llm.timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout("LLM_TIMEOUT_SECS"));
    }

    if require_llm && config.llm.api_key.is_none() {
        missing.push("OPENAI_API_KEY");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Missing(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[tokio::test]
    async fn read_config_file_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(&tmp.path().join("caradvisor.toml")).await.unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn read_config_file_valid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caradvisor.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9100

[llm]
model = "gpt-4o"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[tokio::test]
    async fn read_config_file_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caradvisor.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!").await.unwrap();

        let err = read_config_file(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("API_PORT", "8080"),
                ("CORS_ORIGINS", "https://cars.example.com, http://localhost:4000,"),
                ("OPENAI_API_KEY", "sk-env"),
                ("LLM_TIMEOUT_SECS", "12"),
                ("MAX_HISTORY_TURNS", "4"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.cors_origins,
            vec!["https://cars.example.com", "http://localhost:4000"]
        );
        assert_eq!(config.llm.api_key.as_ref().unwrap().expose_secret(), "sk-env");
        assert_eq!(config.llm.timeout_secs, 12);
        assert_eq!(config.chat.max_history_turns, 4);
    }

    #[test]
    fn supabase_variables_are_fallbacks() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SUPABASE_URL", "https://project.supabase.co"),
                ("SUPABASE_ANON_KEY", "anon"),
                ("SUPABASE_SERVICE_KEY", "service"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.url, "https://project.supabase.co");
        assert_eq!(config.database.key.as_ref().unwrap().expose_secret(), "service");
        assert_eq!(config.database.backend(), Some(DatabaseBackend::Rest));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("OPENAI_API_KEY", "  "), ("API_HOST", "")])).unwrap();
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("API_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "API_PORT", .. }));
    }

    #[test]
    fn validate_lists_every_missing_variable() {
        let mut config = AppConfig::default();
        config.database.url = "https://project.supabase.co".to_string();

        match validate(&config, true) {
            Err(ConfigError::Missing(vars)) => {
                assert_eq!(vars, vec!["DATABASE_KEY", "OPENAI_API_KEY"]);
            }
            other => panic!("expected missing variables, got {other:?}"),
        }
    }

    #[test]
    fn validate_catalog_only_skips_llm_key() {
        let config = AppConfig::default();
        assert!(validate(&config, false).is_ok());
        assert!(matches!(validate(&config, true), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn validate_rejects_unknown_database() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://localhost/cars".to_string();
        assert!(matches!(
            validate(&config, false),
            Err(ConfigError::UnsupportedDatabase(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;
        assert!(matches!(
            validate(&config, false),
            Err(ConfigError::ZeroTimeout("LLM_TIMEOUT_SECS"))
        ));

        config.llm.timeout_secs = 30;
        config.database.timeout_secs = 0;
        assert!(matches!(
            validate(&config, false),
            Err(ConfigError::ZeroTimeout("DATABASE_TIMEOUT_SECS"))
        ));
    }
}
