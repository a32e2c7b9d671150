//! correlog demo server
//!
//! ```text
//!     Client Request
//!     ──────▶ TraceLayer ──▶ Timeout ──▶ RequestLogLayer ──▶ handler
//!                                          │  scope + correlation id
//!                                          ▼
//!     Client Response ◀── CaptureBody ◀── correlation header
//!                            │
//!                            └──▶ response record (stdout JSON line)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use correlog::config::{load_config, watcher::ConfigWatcher, AppConfig};
use correlog::context::LoggerConfig;
use correlog::http::server::spawn_config_reloader;
use correlog::http::HttpServer;
use correlog::observability::logging::{self, Profile};
use correlog::observability::Logger;

#[derive(Parser)]
#[command(name = "correlog")]
#[command(about = "Demo HTTP server with request-scoped structured logging", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    let logger_config = Arc::new(LoggerConfig::new(config.logging.clone()));
    let settings = logger_config.runtime();
    logging::init(Profile::from_settings(&settings), &settings);

    tracing::info!(
        bind_address = %config.server.bind_address,
        level = %settings.level,
        local = settings.local,
        hidden_fields = logger_config.hidden_fields().as_slice().len(),
        "correlog v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let logger = Logger::stdout(logger_config);

    // Keep the watcher alive for the lifetime of the server
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            spawn_config_reloader(logger.clone(), updates);
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = HttpServer::new(&config, &logger);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
