//! Typed view over the MOT history API's vehicle payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::expiry::parse_api_date;

/// A vehicle as returned by the history API.
///
/// Only the fields the fleet views read are typed; everything else is carried in `extra` so a
/// record can be written back out without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub registration: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub primary_colour: Option<String>,
    /// Most recent test first, per the API contract.
    #[serde(default)]
    pub mot_tests: Vec<MotTest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleRecord {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn latest_test(&self) -> Option<&MotTest> {
        self.mot_tests.first()
    }

    /// Expiry date of the most recent MOT test, when present and parseable.
    pub fn mot_expiry(&self) -> Option<chrono::NaiveDate> {
        self.latest_test()
            .and_then(|test| test.expiry_date.as_deref())
            .and_then(parse_api_date)
    }

    pub fn recent_tests(&self, limit: usize) -> &[MotTest] {
        let end = self.mot_tests.len().min(limit);
        &self.mot_tests[..end]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotTest {
    #[serde(default)]
    pub completed_date: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub test_result: Option<String>,
    #[serde(default)]
    pub odometer_value: Option<Odometer>,
    #[serde(default)]
    pub odometer_unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub mot_test_number: Option<String>,
    #[serde(default)]
    pub defects: Vec<Defect>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MotTest {
    /// `YYYY-MM-DD` prefix of the completion timestamp.
    pub fn completed_day(&self) -> Option<&str> {
        self.completed_date
            .as_deref()
            .map(|raw| raw.get(..10).unwrap_or(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defect {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub dangerous: Option<bool>,
}

/// Odometer readings arrive as either JSON numbers or strings depending on the API version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Odometer {
    Number(u64),
    Text(String),
}

impl fmt::Display for Odometer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Odometer::Number(value) => write!(f, "{value}"),
            Odometer::Text(value) => f.write_str(value),
        }
    }
}
