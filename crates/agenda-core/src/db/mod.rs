//! SQLite persistence for local events

mod connection;
mod event_store;
mod migrations;

pub use connection::Database;
pub use event_store::SqliteEventStore;
