//! RPS Duel Server
//!
//! Accepts players, pairs them into sessions in arrival order,
//! and serves session snapshots until either player leaves.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rps_duel::{GameServer, ServerConfig, DEFAULT_HOST, DEFAULT_PORT, VERSION};

/// Two-player rock-paper-scissors session server
#[derive(Parser, Debug)]
#[command(name = "rps-duel-server")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Close connections idle for this many seconds (0 disables)
    #[arg(long, default_value_t = 300)]
    idle_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            idle_timeout: (self.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(self.idle_timeout_secs)),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Args::parse().into_config();
    info!("RPS Duel Server v{}", VERSION);

    let server = match GameServer::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };
    info!("Waiting for a connection, server started");

    tokio::select! {
        result = server.run() => result.context("accept loop failed")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
