//! Duo-taire server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: game on :2567, observability HTTP on :2568
//! duotaire-server
//!
//! # Environment-driven deployment
//! PORT=9000 HTTP_PORT=9001 duotaire-server --log-level debug
//! ```

use clap::Parser;
use duotaire_server::DuotaireServer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Authoritative Duo-taire game server
#[derive(Parser, Debug)]
#[command(name = "duotaire-server")]
#[command(about = "Two-player Duo-taire card game server")]
#[command(version)]
struct Args {
    /// Game transport port
    #[arg(long, env = "PORT", default_value_t = 2567)]
    port: u16,

    /// Observability HTTP port (defaults to the game port + 1)
    #[arg(long, env = "HTTP_PORT")]
    http_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let game_addr = format!("0.0.0.0:{}", args.port);
    let http_port = args.http_port.unwrap_or(args.port + 1);
    let http_addr = format!("0.0.0.0:{http_port}");

    let server = DuotaireServer::builder().bind(&game_addr).build().await?;
    tracing::info!(addr = %game_addr, "game transport bound");

    let router = server.http_router();
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!(addr = %http_addr, "observability endpoints bound");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, router).await {
            tracing::error!(error = %e, "http server stopped");
        }
    });

    server.run().await?;
    Ok(())
}
