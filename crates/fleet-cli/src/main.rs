use anyhow::{Context, Error};
use chrono::Local;
use clap::Parser;
use fleet_cli::config::config_path;
use fleet_cli::{BackendClient, Cli, Command, driver_check, execute, load_config};
use fleet_core::{JsonFileStorage, LoggingDestination, WatchList, init_logging};
use tracing::{debug, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<(), Error> {
    if let Err(err) = init_logging(LoggingDestination::FileOnly) {
        eprintln!("[fleet] Logging unavailable: {err}");
    }

    if cli.command == Command::Driver {
        print_lines(&driver_check());
        return Ok(());
    }

    let path = cli.config.clone().unwrap_or_else(config_path);
    let loaded = load_config(&path);
    for warning in &loaded.warnings {
        warn!(%warning, "Config warning");
        eprintln!("Warning: {warning}");
    }
    debug!(source = ?loaded.source, path = %path.display(), "Loaded CLI config");

    let backend_url = cli
        .backend
        .clone()
        .unwrap_or_else(|| loaded.config.backend_url.clone());
    let client = reqwest::Client::builder()
        .user_agent(concat!("fleet/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let backend = BackendClient::new(client, backend_url);

    if cli.command == Command::Ping {
        let reply = backend
            .ping()
            .await
            .with_context(|| format!("backend at {} is unreachable", backend.base_url()))?;
        println!("{reply}");
        return Ok(());
    }

    let storage = match &cli.data_dir {
        Some(dir) => JsonFileStorage::in_directory(dir),
        None => JsonFileStorage::user_default(),
    };
    let mut list = WatchList::initialize(storage, &loaded.config.default_registrations())
        .context("failed to load the saved watch list")?;

    let lines = execute(&cli.command, &mut list, &backend, Local::now().naive_local()).await?;
    print_lines(&lines);
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
