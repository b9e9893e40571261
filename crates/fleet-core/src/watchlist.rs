//! The user's watched-vehicle collection and its persistence.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::config_directory;
use crate::lookup::VehicleSource;
use crate::vehicle::VehicleRecord;

/// Key the persisted list is stored under.
pub const STORAGE_KEY: &str = "savedRegistrations";

/// Registrations every watch list starts with.
pub const DEFAULT_REGISTRATIONS: &[&str] = &["DF04BEY", "D1PLO", "MK63XAR"];

#[derive(Debug, Error)]
pub enum WatchListError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode watch list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted projection of one watched vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEntry {
    pub registration: String,
    #[serde(default)]
    pub insurance_expiry: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchedVehicle {
    pub registration: String,
    pub vehicle_data: Option<VehicleRecord>,
    pub expanded: bool,
    pub insurance_expiry: String,
}

impl WatchedVehicle {
    fn pending(registration: String, insurance_expiry: String) -> Self {
        Self {
            registration,
            vehicle_data: None,
            expanded: false,
            insurance_expiry,
        }
    }

    pub fn mot_expiry(&self) -> Option<chrono::NaiveDate> {
        self.vehicle_data.as_ref().and_then(VehicleRecord::mot_expiry)
    }
}

/// Backend holding the serialized watch list under [`STORAGE_KEY`].
pub trait WatchListStorage {
    /// Raw stored value, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<String>, WatchListError>;
    fn save(&mut self, raw: &str) -> Result<(), WatchListError>;
}

/// Storage that lives only as long as the value does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    value: Option<String>,
}

impl MemoryStorage {
    pub fn with_value(raw: impl Into<String>) -> Self {
        Self {
            value: Some(raw.into()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl WatchListStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, WatchListError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, raw: &str) -> Result<(), WatchListError> {
        self.value = Some(raw.to_string());
        Ok(())
    }
}

/// JSON file named after [`STORAGE_KEY`] inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn in_directory(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Storage under the per-user configuration directory.
    pub fn user_default() -> Self {
        Self::in_directory(config_directory())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WatchListStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>, WatchListError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(WatchListError::Io(err)),
        }
    }

    fn save(&mut self, raw: &str) -> Result<(), WatchListError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// A lookup the store has started but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub registration: String,
    pub insurance_expiry: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LookupFailure {
    registration: String,
    message: String,
}

/// Trimmed, upper-cased registration.
pub fn normalize_registration(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Owner of the canonical watched-vehicle collection.
///
/// Commands mutate the list and re-persist the `{registration, insuranceExpiry}` projection.
/// The set of requested registrations is session state: it is never persisted, so a lookup is
/// started at most once per store instance.
#[derive(Debug)]
pub struct WatchList<S: WatchListStorage> {
    storage: S,
    vehicles: Vec<WatchedVehicle>,
    requested: HashSet<String>,
    pending: Vec<PendingLookup>,
    in_flight: HashSet<String>,
    errors: Vec<LookupFailure>,
}

impl<S: WatchListStorage> WatchList<S> {
    /// Loads the persisted list, merges it behind `defaults`, and queues a lookup per entry.
    pub fn initialize(storage: S, defaults: &[&str]) -> Result<Self, WatchListError> {
        let saved = read_entries(&storage)?;
        let defaults: Vec<String> = defaults
            .iter()
            .map(|registration| normalize_registration(registration))
            .filter(|registration| !registration.is_empty())
            .collect();

        // A saved entry that collides with a default is dropped, but its insurance expiry is
        // carried over so edits to default vehicles survive a reload.
        let seeded: Vec<PersistedEntry> = defaults
            .iter()
            .map(|registration| PersistedEntry {
                registration: registration.clone(),
                insurance_expiry: saved
                    .iter()
                    .find(|entry| &entry.registration == registration)
                    .map(|entry| entry.insurance_expiry.clone())
                    .unwrap_or_default(),
            })
            .collect();
        let merged = seeded.into_iter().chain(
            saved
                .into_iter()
                .filter(|entry| !defaults.contains(&entry.registration)),
        );

        let mut list = Self {
            storage,
            vehicles: Vec::new(),
            requested: HashSet::new(),
            pending: Vec::new(),
            in_flight: HashSet::new(),
            errors: Vec::new(),
        };

        for entry in merged {
            if list.position(&entry.registration).is_some() {
                continue;
            }
            list.vehicles.push(WatchedVehicle::pending(
                entry.registration.clone(),
                entry.insurance_expiry.clone(),
            ));
            list.request(entry.registration, entry.insurance_expiry);
        }

        debug!(count = list.vehicles.len(), "Watch list initialized");
        Ok(list)
    }

    /// Starts watching `raw` once normalized.
    ///
    /// Returns the normalized registration when a new lookup was queued; the vehicle joins the list
    /// only once that lookup succeeds. Blank input, a registration already listed, and one already
    /// requested this session are no-ops.
    pub fn add(&mut self, raw: &str) -> Option<String> {
        let registration = normalize_registration(raw);
        if registration.is_empty()
            || self.requested.contains(&registration)
            || self.position(&registration).is_some()
        {
            return None;
        }

        self.request(registration.clone(), String::new());
        Some(registration)
    }

    pub fn remove(&mut self, registration: &str) -> Result<(), WatchListError> {
        let Some(index) = self.position(registration) else {
            return Ok(());
        };
        self.vehicles.remove(index);
        self.persist()
    }

    pub fn toggle_expanded(&mut self, registration: &str) -> Result<(), WatchListError> {
        let Some(index) = self.position(registration) else {
            return Ok(());
        };
        let vehicle = &mut self.vehicles[index];
        vehicle.expanded = !vehicle.expanded;
        self.persist()
    }

    /// Overwrites the insurance expiry verbatim; the value is not validated as a date.
    pub fn set_insurance_expiry(
        &mut self,
        registration: &str,
        date: &str,
    ) -> Result<(), WatchListError> {
        let Some(index) = self.position(registration) else {
            return Ok(());
        };
        self.vehicles[index].insurance_expiry = date.to_string();
        self.persist()
    }

    /// Hands out the queued lookups, leaving them marked as requested.
    pub fn take_pending(&mut self) -> Vec<PendingLookup> {
        let pending = std::mem::take(&mut self.pending);
        self.in_flight
            .extend(pending.iter().map(|lookup| lookup.registration.clone()));
        pending
    }

    /// Applies the outcome of a lookup started by [`take_pending`](Self::take_pending).
    ///
    /// Success fills in (or appends) the vehicle and clears that registration's error. Failure
    /// records `Error fetching {registration}: {message}` and leaves the list unchanged.
    pub fn complete_lookup(
        &mut self,
        lookup: PendingLookup,
        outcome: Result<Value, String>,
    ) -> Result<(), WatchListError> {
        self.in_flight.remove(&lookup.registration);
        let record = outcome.and_then(|value| {
            VehicleRecord::from_value(value).map_err(|err| format!("unexpected response: {err}"))
        });

        match record {
            Ok(record) => {
                self.clear_error(&lookup.registration);
                match self.position(&lookup.registration) {
                    Some(index) => self.vehicles[index].vehicle_data = Some(record),
                    None => self.vehicles.push(WatchedVehicle {
                        registration: lookup.registration,
                        vehicle_data: Some(record),
                        expanded: false,
                        insurance_expiry: lookup.insurance_expiry,
                    }),
                }
                self.persist()
            }
            Err(message) => {
                warn!(registration = %lookup.registration, %message, "Vehicle lookup failed");
                self.clear_error(&lookup.registration);
                self.errors.push(LookupFailure {
                    message: format!("Error fetching {}: {}", lookup.registration, message),
                    registration: lookup.registration,
                });
                Ok(())
            }
        }
    }

    /// Runs every queued lookup against `source` concurrently, then applies results in queue order.
    pub async fn fetch_pending<V: VehicleSource>(
        &mut self,
        source: &V,
    ) -> Result<(), WatchListError> {
        let pending = self.take_pending();
        if pending.is_empty() {
            return Ok(());
        }

        let outcomes = join_all(
            pending
                .iter()
                .map(|lookup| source.fetch_vehicle(&lookup.registration)),
        )
        .await;

        for (lookup, outcome) in pending.into_iter().zip(outcomes) {
            self.complete_lookup(lookup, outcome)?;
        }
        Ok(())
    }

    pub fn vehicles(&self) -> &[WatchedVehicle] {
        &self.vehicles
    }

    pub fn get(&self, registration: &str) -> Option<&WatchedVehicle> {
        self.position(registration).map(|index| &self.vehicles[index])
    }

    /// One message per registration whose most recent lookup failed, in failure order.
    pub fn errors(&self) -> Vec<&str> {
        self.errors
            .iter()
            .map(|failure| failure.message.as_str())
            .collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(|failure| failure.message.as_str())
    }

    /// True while any lookup is queued or handed out but not yet completed.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty() || !self.in_flight.is_empty()
    }

    pub fn is_requested(&self, registration: &str) -> bool {
        self.requested.contains(registration)
    }

    pub fn entries(&self) -> Vec<PersistedEntry> {
        self.vehicles
            .iter()
            .map(|vehicle| PersistedEntry {
                registration: vehicle.registration.clone(),
                insurance_expiry: vehicle.insurance_expiry.clone(),
            })
            .collect()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn request(&mut self, registration: String, insurance_expiry: String) {
        if self.requested.insert(registration.clone()) {
            self.pending.push(PendingLookup {
                registration,
                insurance_expiry,
            });
        }
    }

    fn clear_error(&mut self, registration: &str) {
        self.errors
            .retain(|failure| failure.registration != registration);
    }

    fn position(&self, registration: &str) -> Option<usize> {
        self.vehicles
            .iter()
            .position(|vehicle| vehicle.registration == registration)
    }

    fn persist(&mut self) -> Result<(), WatchListError> {
        let raw = serde_json::to_string(&self.entries())?;
        self.storage.save(&raw)
    }
}

fn read_entries<S: WatchListStorage>(storage: &S) -> Result<Vec<PersistedEntry>, WatchListError> {
    let Some(raw) = storage.load()? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Vec<PersistedEntry>>(&raw) {
        Ok(entries) => Ok(entries
            .into_iter()
            .map(|entry| PersistedEntry {
                registration: normalize_registration(&entry.registration),
                insurance_expiry: entry.insurance_expiry,
            })
            .filter(|entry| !entry.registration.is_empty())
            .collect()),
        Err(err) => {
            warn!(error = %err, "Ignoring unreadable saved watch list");
            Ok(Vec::new())
        }
    }
}
