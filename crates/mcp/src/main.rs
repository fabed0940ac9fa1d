//! Resin MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! SF_CLIENT_ID=... SF_CLIENT_SECRET=... SF_REFRESH_TOKEN=... resin-mcp
//!
//! # Verbose logs on stderr
//! RUST_LOG=resin_core=debug resin-mcp
//! ```

use anyhow::Result;
use resin_core::config::{AppConfig, LoadOptions, LogFormat};
use resin_mcp::ResinMcpServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stdout carries the protocol, so logs go to stderr. `RUST_LOG` wins over
/// the configured level when set.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    info!(
        event_name = "mcp.config.loaded",
        api_version = %config.salesforce.api_version,
        domain = config.salesforce.domain.as_str(),
        oauth_ready = config.salesforce.has_refresh_credentials(),
        cache_ttl_secs = config.query.cache_ttl_secs,
        "configuration loaded"
    );

    let server = ResinMcpServer::from_config(&config)?;
    server.run_stdio().await
}
