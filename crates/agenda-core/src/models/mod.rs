//! Data models for Agenda

mod event;
mod remote_event;

pub use event::{Event, EventId, DEFAULT_CATEGORY};
pub use remote_event::RemoteEvent;
