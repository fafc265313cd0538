//! Speed Test Server - main binary
//!
//! Validates the built-in configuration, then serves the download, latency
//! and connectivity endpoints on all interfaces.

use colored::Colorize;
use speed_test_server::{
    build_router,
    config::{display_config_summary, validate_config, ValidationLevel},
    error::{AppError, Result},
    log_info, log_warn,
    logging::{LogSettings, LoggerFactory},
    AppState, ServerConfig, PKG_DESCRIPTION, PKG_NAME, VERSION,
};
use std::process;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    if let Err(e) = run_server().await {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn run_server() -> Result<()> {
    let config = ServerConfig::default();
    let warnings = validate_config(&config)?;

    let factory = LoggerFactory::new(LogSettings::default());
    let state = AppState::from_factory(config, &factory).await?;

    for warning in &warnings {
        match warning.level {
            ValidationLevel::Warning => log_warn!(state.logger, "{}", warning.message),
            ValidationLevel::Info => log_info!(state.logger, "{}", warning.message),
        }
    }

    print_startup_banner(&state.config, factory.session_id());

    let address = state.config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::io(format!("Failed to bind {}: {}", address, e)))?;
    log_info!(state.logger, "Listening on http://{}", address);

    let logger = state.logger.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info!(logger, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // An error here means no signal handler could be installed; keep serving
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn print_startup_banner(config: &ServerConfig, session_id: &str) {
    let title = format!("{} v{}", PKG_NAME, VERSION);
    println!("{}", title.bold().cyan());
    println!("{}", PKG_DESCRIPTION.dimmed());
    println!("{}", "=".repeat(60).dimmed());
    println!("{}", display_config_summary(config));
    println!(
        "  Listening on: {}",
        format!("http://{}", config.bind_address()).green().bold()
    );
    println!(
        "  Build: {} {} ({})",
        option_env!("GIT_COMMIT").unwrap_or("unknown"),
        option_env!("BUILD_TIME").unwrap_or("unknown"),
        option_env!("TARGET_TRIPLE").unwrap_or("unknown")
    );
    println!("  Session: {}", session_id.dimmed());
    println!("{}", "=".repeat(60).dimmed());
}
