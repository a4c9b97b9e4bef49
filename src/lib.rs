//! Parcel tracking over SQLite.
//!
//! # Intention
//!
//! - Persist parcels in a single `parcel` table behind the [`store::ParcelStore`] trait.
//! - Keep the status state machine and creation defaults in [`service::ParcelService`].
//! - Encapsulate SQLite-specific logic, types and error handling in [`sqlite`].
//!
//! # Architectural Boundaries
//!
//! - Only [`sqlite`] and [`store::SqliteParcelStore`] talk to the database.
//! - The service never issues SQL; it only sees the storage trait.
//! - Address changes and deletions are guarded inside the SQL statement, never by a prior read.

pub mod config;
pub mod demo;
pub mod error;
pub mod model;
pub mod service;
pub mod sqlite;
pub mod store;

pub use error::{GuardedAction, ServiceError, StoreError};
pub use model::{Parcel, ParcelStatus};
pub use service::ParcelService;
pub use store::{ParcelStore, SqliteParcelStore};
