use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(name = "fleet", version, about = "Watch MOT and insurance expiry for a fleet of vehicles")]
pub struct Cli {
    /// Backend base URL (overrides `backend_url` from config.toml).
    #[arg(long, global = true, value_name = "URL")]
    pub backend: Option<String>,

    /// Alternate config.toml location.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding the saved watch list.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print every watched vehicle, soonest MOT expiry first.
    #[command(alias = "ls")]
    List,
    /// Start watching a registration.
    Add {
        registration: String,
    },
    /// Stop watching a registration.
    #[command(alias = "rm")]
    Remove {
        registration: String,
    },
    /// Record the insurance expiry date (YYYY-MM-DD) for a watched vehicle.
    Insurance {
        registration: String,
        date: String,
    },
    /// Print the list with one vehicle's details expanded.
    Show {
        registration: String,
    },
    /// Run the mocked driver licence check.
    Driver,
    /// Check that the backend is reachable.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insurance_with_global_backend() {
        let cli = Cli::try_parse_from([
            "fleet",
            "insurance",
            "df04bey",
            "2025-03-01",
            "--backend",
            "http://localhost:9000",
        ])
        .expect("parse");
        assert_eq!(cli.backend.as_deref(), Some("http://localhost:9000"));
        assert_eq!(
            cli.command,
            Command::Insurance {
                registration: "df04bey".to_string(),
                date: "2025-03-01".to_string(),
            }
        );
    }

    #[test]
    fn remove_accepts_rm_alias() {
        let cli = Cli::try_parse_from(["fleet", "rm", "D1PLO"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Remove {
                registration: "D1PLO".to_string()
            }
        );
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["fleet"]).is_err());
        assert!(Cli::try_parse_from(["fleet", "add"]).is_err());
    }
}
