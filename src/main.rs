//! Wellscore - assessment analysis gateway
//!
//! Async gateway service with pattern-based analysis caching and a
//! deterministic rule-based fallback

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wellscore::server;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging system; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    // Start server (auto-loads config/gateway.yaml)
    match server::builder::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
