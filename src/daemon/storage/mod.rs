//! Storage is organized through [event_log::EventLog].
//! The basic idea is:
//!  - Events are appended to plain-text partition files, one per local
//!    calendar day, under `logs/<year>/<MM>/<DD>/file_events.log`.
//!  - Partitions are append-only. Lines are never rewritten or deleted.
//!  - The viewer reads a partition in reverse append order.

pub mod event_log;
