//! Car Advisor CLI and REST API entry point.
//!
//! Binary name: `caradvisor`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use std::sync::Arc;

use clap::Parser;
use clap_complete::generate;

use caradvisor_core::service::car::CarService;
use caradvisor_infra::catalog::CatalogStore;
use caradvisor_infra::config::load_config;
use caradvisor_observe::tracing_setup::{LogOptions, init_tracing, shutdown_tracing};

use cli::{CarsCommand, Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need configuration or logging
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "caradvisor", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&LogOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let require_llm = matches!(cli.command, Commands::Serve { .. });
    let mut config = load_config(&cli.config, require_llm).await?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let state = AppState::init(&config).await?;

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, model = %config.llm.model, "server listening");

            if !cli.quiet {
                println!(
                    "  {} {} listening on {}",
                    console::style("⚡").bold(),
                    config.app.name,
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state, &config.server.cors_origins);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("server stopped");
        }

        Commands::Check => {
            cli::check::check(&config, cli.json).await?;
        }

        Commands::Cars { action } => match action {
            CarsCommand::List(filters) => {
                let store = CatalogStore::connect(&config.database).await?;
                let service = CarService::new(Arc::new(store));
                cli::cars::list_cars(&service, filters.into(), cli.json).await?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled before configuration is loaded"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
