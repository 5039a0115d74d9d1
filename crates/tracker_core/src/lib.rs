//! Core domain logic for the parcel tracker.
//! This crate is the single source of truth for parcel lifecycle invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, TrackerConfig};
pub use logging::{init_logging, LogSink};
pub use model::parcel::{ClientId, NewParcel, Parcel, ParcelNumber, ParcelStatus};
pub use repo::parcel_repo::{ParcelStore, RepoError, RepoResult, SqliteParcelStore};
pub use service::parcel_service::{LogNotifier, ParcelEvent, ParcelNotifier, ParcelService};
