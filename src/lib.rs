pub mod client;
pub mod config_store;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod geocode;
pub mod models;
pub mod pipeline;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::Error;
pub use models::*;

// Extractor re-exports
pub use extractor::{AddressSource, FieldMapping, RecordExtractor, compose_address};

// Filter re-exports
pub use filter::{FilterOptions, RecordFilter};

// Geocode re-exports
pub use geocode::{CachePolicy, CacheStats, Coordinates, GeocodeCache, Geocoder, RateLimitedGeocoder};

// Config store re-exports
pub use config_store::{ConfigStore, DashboardConfig, FileConfigStore};

pub use pipeline::fetch_records;
