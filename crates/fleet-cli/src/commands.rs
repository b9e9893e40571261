use chrono::NaiveDateTime;
use fleet_core::driver::{generate_licence_number, mock_driver_record, render_driver_check};
use fleet_core::watchlist::normalize_registration;
use fleet_core::{VehicleSource, WatchList, WatchListError, WatchListStorage, build_cards};
use thiserror::Error;
use tracing::info;

use crate::cli_args::Command;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Storage(#[from] WatchListError),
    #[error("registration must not be blank")]
    BlankRegistration,
    #[error("{0} is not on the watch list")]
    NotWatched(String),
    #[error("`{0}` does not operate on the watch list")]
    Unsupported(&'static str),
}

/// Applies `command` to the store and returns the lines to print.
///
/// Lookups queued when the store was initialized run first, so every command sees fetched data.
pub async fn execute<S, V>(
    command: &Command,
    list: &mut WatchList<S>,
    source: &V,
    now: NaiveDateTime,
) -> Result<Vec<String>, CommandError>
where
    S: WatchListStorage,
    V: VehicleSource,
{
    list.fetch_pending(source).await?;

    let mut notes = Vec::new();
    match command {
        Command::List => {}
        Command::Add { registration } if normalize_registration(registration).is_empty() => {
            return Err(CommandError::BlankRegistration);
        }
        Command::Add { registration } => match list.add(registration) {
            Some(registration) => {
                info!(%registration, "Adding vehicle");
                list.fetch_pending(source).await?;
                if list.get(&registration).is_some() {
                    notes.push(format!("Now watching {registration}."));
                }
            }
            None => notes.push(format!(
                "{} is already on the watch list.",
                normalize_registration(registration)
            )),
        },
        Command::Remove { registration } => {
            let registration = watched(list, registration)?;
            list.remove(&registration)?;
            notes.push(format!("Stopped watching {registration}."));
        }
        Command::Insurance { registration, date } => {
            let registration = watched(list, registration)?;
            list.set_insurance_expiry(&registration, date)?;
            notes.push(format!("Insurance expiry for {registration} set to {date}."));
        }
        Command::Show { registration } => {
            let registration = watched(list, registration)?;
            let expanded = list
                .get(&registration)
                .map(|vehicle| vehicle.expanded)
                .unwrap_or(false);
            if !expanded {
                list.toggle_expanded(&registration)?;
            }
        }
        Command::Driver => return Err(CommandError::Unsupported("driver")),
        Command::Ping => return Err(CommandError::Unsupported("ping")),
    }

    Ok(render(list, notes, now))
}

fn watched<S: WatchListStorage>(
    list: &WatchList<S>,
    raw: &str,
) -> Result<String, CommandError> {
    let registration = normalize_registration(raw);
    if list.get(&registration).is_some() {
        Ok(registration)
    } else {
        Err(CommandError::NotWatched(registration))
    }
}

fn render<S: WatchListStorage>(
    list: &WatchList<S>,
    notes: Vec<String>,
    now: NaiveDateTime,
) -> Vec<String> {
    let mut lines = notes;
    for error in list.errors() {
        lines.push(format!("! {error}"));
    }

    let cards = build_cards(list.vehicles(), now);
    if cards.is_empty() {
        lines.push("No vehicles on the watch list.".to_string());
    }
    for card in cards {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(card.render_lines());
    }
    lines
}

/// The mocked licence check, rendered for a freshly generated licence number.
pub fn driver_check() -> Vec<String> {
    render_driver_check(&generate_licence_number(), &mock_driver_record())
}
