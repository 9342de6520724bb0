//! `caradvisor check`: configuration and catalog connectivity report.

use anyhow::Result;
use console::style;

use caradvisor_core::repository::car::CarRepository;
use caradvisor_infra::catalog::CatalogStore;
use caradvisor_types::config::{AppConfig, DatabaseBackend};

/// Connect to the catalog, fetch at most one row, and report.
///
/// Returns an error (non-zero exit) when the catalog is unreachable.
pub async fn check(config: &AppConfig, json: bool) -> Result<()> {
    let backend = match config.database.backend() {
        Some(DatabaseBackend::Sqlite) => "sqlite",
        Some(DatabaseBackend::Rest) => "postgrest",
        None => "unsupported",
    };
    let llm_configured = config.llm.api_key.is_some();

    let catalog = match CatalogStore::connect(&config.database).await {
        Ok(store) => store.ping().await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    if json {
        let report = serde_json::json!({
            "database": {
                "backend": backend,
                "reachable": catalog.is_ok(),
                "error": catalog.as_ref().err(),
            },
            "llm": {
                "base_url": config.llm.base_url,
                "model": config.llm.model,
                "api_key_configured": llm_configured,
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mark = |ok: bool| {
            if ok {
                format!("{}", style("✓").green())
            } else {
                format!("{}", style("✗").red())
            }
        };
        println!();
        println!("  {} Car Advisor check", style("🔍").bold());
        println!();
        println!("  {} Catalog ({backend}) reachable", mark(catalog.is_ok()));
        if let Err(e) = &catalog {
            println!("      {}", style(e).dim());
        }
        println!(
            "  {} LLM API key configured ({} @ {})",
            mark(llm_configured),
            config.llm.model,
            config.llm.base_url
        );
        println!();
    }

    catalog.map_err(|e| anyhow::anyhow!("catalog unreachable: {e}"))
}
