//! agenda-core - Core library for Agenda
//!
//! This crate contains the event models, the local event store, and the
//! two-way synchronization engine that reconciles local events with an
//! external calendar. User interfaces (CLI, desktop) build on top of it.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod util;

pub use config::SyncConfig;
pub use error::{Error, Result};
pub use models::{Event, EventId, RemoteEvent};
pub use sync::{SyncEngine, SyncError, SyncReport};
