//! Read-only display projection of the watch list.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::expiry::{ExpiryBucket, ExpiryStatus, classify_at, parse_api_date};
use crate::vehicle::MotTest;
use crate::watchlist::WatchedVehicle;

/// How many MOT tests an expanded card lists.
pub const RECENT_TEST_LIMIT: usize = 3;

/// Visual state a card or expiry label is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Red,
    Yellow,
    Green,
    Neutral,
}

impl Tone {
    pub fn for_status(status: Option<ExpiryStatus>) -> Self {
        match status.map(|status| status.bucket) {
            Some(ExpiryBucket::Critical) => Tone::Red,
            Some(ExpiryBucket::Warning) => Tone::Yellow,
            Some(ExpiryBucket::Ok) => Tone::Green,
            None => Tone::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tone::Red => "red",
            Tone::Yellow => "yellow",
            Tone::Green => "green",
            Tone::Neutral => "neutral",
        }
    }
}

/// Orders vehicles by the expiry of their most recent MOT test, soonest first.
///
/// Vehicles without MOT data (not yet fetched, no tests, or an unparseable date) sort after every
/// dated vehicle and keep their insertion order.
pub fn sort_by_mot_expiry(vehicles: &[WatchedVehicle]) -> Vec<&WatchedVehicle> {
    let mut sorted: Vec<&WatchedVehicle> = vehicles.iter().collect();
    sorted.sort_by_key(|vehicle| sort_key(vehicle.mot_expiry()));
    sorted
}

fn sort_key(expiry: Option<NaiveDate>) -> (bool, NaiveDate) {
    match expiry {
        Some(date) => (false, date),
        None => (true, NaiveDate::MAX),
    }
}

/// Everything a card needs to render one watched vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCard {
    pub registration: String,
    pub tone: Tone,
    pub mot: Option<ExpiryLine>,
    pub insurance: Option<ExpiryLine>,
    pub insurance_expiry: String,
    pub expanded: bool,
    pub details: Option<CardDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryLine {
    pub date: NaiveDate,
    pub status: ExpiryStatus,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetails {
    pub make: String,
    pub model: String,
    pub fuel_type: String,
    pub primary_colour: String,
    pub recent_tests: Vec<TestSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub date: String,
    pub result: String,
    pub odometer: String,
    pub location: String,
    pub test_number: String,
    pub defects: Vec<String>,
}

impl TestSummary {
    fn from_test(test: &MotTest) -> Self {
        Self {
            date: test.completed_day().unwrap_or_default().to_string(),
            result: test
                .test_result
                .as_deref()
                .unwrap_or_default()
                .to_uppercase(),
            odometer: test
                .odometer_value
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            location: non_empty_or_na(test.location.as_deref()),
            test_number: non_empty_or_na(test.mot_test_number.as_deref()),
            defects: test
                .defects
                .iter()
                .map(|defect| {
                    format!(
                        "[{}] {}",
                        defect.kind.as_deref().unwrap_or_default(),
                        defect.text.as_deref().unwrap_or_default()
                    )
                })
                .collect(),
        }
    }
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "N/A".to_string(),
    }
}

impl VehicleCard {
    pub fn build(vehicle: &WatchedVehicle, now: NaiveDateTime) -> Self {
        let mot = vehicle.mot_expiry().map(|date| expiry_line(date, now));
        let insurance = parse_api_date(&vehicle.insurance_expiry).map(|date| expiry_line(date, now));

        let details = match (vehicle.expanded, vehicle.vehicle_data.as_ref()) {
            (true, Some(record)) => Some(CardDetails {
                make: record.make.clone().unwrap_or_default(),
                model: record.model.clone().unwrap_or_default(),
                fuel_type: record.fuel_type.clone().unwrap_or_default(),
                primary_colour: record.primary_colour.clone().unwrap_or_default(),
                recent_tests: record
                    .recent_tests(RECENT_TEST_LIMIT)
                    .iter()
                    .map(TestSummary::from_test)
                    .collect(),
            }),
            _ => None,
        };

        Self {
            registration: vehicle.registration.clone(),
            tone: mot.as_ref().map(|line| line.tone).unwrap_or(Tone::Neutral),
            mot,
            insurance,
            insurance_expiry: vehicle.insurance_expiry.clone(),
            expanded: vehicle.expanded,
            details,
        }
    }

    /// Text lines for a terminal rendering of the card.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{} [{}]", self.registration, self.tone.label())];

        if let Some(mot) = &self.mot {
            lines.push(format!(
                "  MOT due: {} ({} days)",
                mot.date.format("%a %b %d %Y"),
                mot.status.days_remaining
            ));
        }

        if let Some(details) = &self.details {
            lines.push(format!("  Make: {}", details.make));
            lines.push(format!("  Model: {}", details.model));
            lines.push(format!("  Fuel Type: {}", details.fuel_type));
            lines.push(format!("  Primary Colour: {}", details.primary_colour));
        }

        if self.expanded || self.insurance.is_some() {
            let mut line = format!("  Insurance Expiry: {}", self.insurance_expiry);
            if let Some(insurance) = &self.insurance {
                let days = insurance.status.days_remaining;
                let plural = if days == 1 { "" } else { "s" };
                line.push_str(&format!(
                    " ({days} day{plural} remaining) [{}]",
                    insurance.tone.label()
                ));
            }
            lines.push(line);
        }

        if let Some(details) = &self.details {
            if !details.recent_tests.is_empty() {
                lines.push("  Recent MOT Tests:".to_string());
            }
            for test in &details.recent_tests {
                lines.push(format!("    Date: {}", test.date));
                lines.push(format!("    Result: {}", test.result));
                lines.push(format!("    Odometer: {} miles", test.odometer));
                lines.push(format!("    Location: {}", test.location));
                lines.push(format!("    MOT Test Number: {}", test.test_number));
                if test.defects.is_empty() {
                    lines.push("    No defects or advisories reported.".to_string());
                } else {
                    lines.push("    Defects / Comments:".to_string());
                    for defect in &test.defects {
                        lines.push(format!("      - {defect}"));
                    }
                }
            }
        }

        lines
    }
}

fn expiry_line(date: NaiveDate, now: NaiveDateTime) -> ExpiryLine {
    let status = classify_at(date, now);
    ExpiryLine {
        date,
        status,
        tone: Tone::for_status(Some(status)),
    }
}

/// Sorted cards for the whole list, evaluated at `now`.
pub fn build_cards(vehicles: &[WatchedVehicle], now: NaiveDateTime) -> Vec<VehicleCard> {
    sort_by_mot_expiry(vehicles)
        .into_iter()
        .map(|vehicle| VehicleCard::build(vehicle, now))
        .collect()
}
