//! Optional in-process runners for the idempotent sweeps.
//!
//! The core logic carries no scheduling policy; these runners are one
//! possible trigger, alongside the `/sweeps` endpoints and external cron.

pub mod no_show;
pub mod schedule_housekeeping;
