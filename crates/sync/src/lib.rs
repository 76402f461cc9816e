//! `warden-sync` — debounced periodic background tasks.
//!
//! "Run at most once per interval" is coordinated through the audit log's
//! last-occurrence query instead of a lock service: a tick skips when the
//! most recent recorded run is younger than the configured interval. This is
//! a best-effort, single-writer-assumed debounce, not mutual exclusion.

pub mod runner;

pub use runner::{
    DebouncedTask, IntervalProvider, JobEffect, JobEffectError, TaskHandle, TickOutcome, spawn,
    tick_at,
};
