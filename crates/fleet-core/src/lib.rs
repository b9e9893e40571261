//! Core library for the fleet watch backend and command-line front end.

pub mod config;
pub mod driver;
pub mod error;
pub mod expiry;
pub mod logging;
pub mod lookup;
pub mod token;
pub mod vehicle;
pub mod view;
pub mod watchlist;

pub use config::{ConfigError, MotApiSettings, ServerConfig, TokenSettings, config_directory};
pub use error::ProxyError;
pub use expiry::{ExpiryBucket, ExpiryStatus, classify, classify_at, classify_on};
pub use logging::{LoggingDestination, LoggingError, init_logging};
pub use lookup::{VehicleLookup, VehicleSource};
pub use token::{AccessToken, TokenExchange, TokenProvider};
pub use vehicle::{MotTest, VehicleRecord};
pub use view::{Tone, VehicleCard, build_cards, sort_by_mot_expiry};
pub use watchlist::{
    DEFAULT_REGISTRATIONS, JsonFileStorage, MemoryStorage, PersistedEntry, WatchList,
    WatchListError, WatchListStorage, WatchedVehicle,
};
