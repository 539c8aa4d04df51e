//! Personal activity-auditing agent. Watches a directory tree for file
//! changes, polls the foreground window title once a second, and appends both
//! event streams to a date-partitioned append-only log store. Access to the
//! stored logs is gated behind a username/password check with a time-limited
//! recovery code.
//!
//! The viewer UI lives outside this crate. It reads partitions through
//! [EventLog](daemon::storage::event_log::EventLog), redirects the watched
//! root through [FileMonitor](daemon::collection::files::FileMonitor), and
//! drives [AuthGate](auth::AuthGate) transitions from its forms.

pub mod auth;
pub mod daemon;
pub mod utils;
pub mod window_api;
