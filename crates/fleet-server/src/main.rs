mod routes;

use std::net::SocketAddr;

use anyhow::{Context, Error};
use fleet_core::{LoggingDestination, ServerConfig, VehicleLookup, init_logging};
use tracing::{info, warn};

use crate::routes::{HttpContext, build_router};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    match init_logging(LoggingDestination::FileAndStderr) {
        Ok(Some(path)) => info!(path = %path.display(), "Logging to file"),
        Ok(None) => {}
        Err(err) => eprintln!("[fleet-server] Logging unavailable: {err}"),
    }

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            "Upstream credentials not set; vehicle lookups will fail"
        );
    }

    let client = reqwest_client()?;
    let context = HttpContext::new(VehicleLookup::from_config(client, &config));
    let router = build_router(context, &config.dist_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Backend listening");

    axum::serve(listener, router).await?;
    Ok(())
}

fn reqwest_client() -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(concat!("fleet-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}
