//! Monitors producing the daemon's event stream. Each monitor runs
//! independently and pushes normalized [MonitorEvent]s onto the shared
//! channel drained by [processing](super::processing).

pub mod files;
pub mod focus;

use chrono::{DateTime, Local};

/// A normalized activity observation carrying its own detection timestamp.
/// The timestamp decides the log partition the event is written to.
#[derive(Debug, Clone)]
pub struct MonitorEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
}
