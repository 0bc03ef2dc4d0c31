//! Domain logic for the StaffHub shift-scheduling, attendance, and payroll
//! engine.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the API, and any future worker or CLI tooling. All
//! state machines, time arithmetic, and pay math live here as pure
//! functions; persistence and HTTP concerns live in `staffhub-db` and
//! `staffhub-api`.

pub mod assignment;
pub mod audit;
pub mod error;
pub mod explanation;
pub mod hashing;
pub mod payroll;
pub mod permissions;
pub mod schedule;
pub mod shift_time;
pub mod swap;
pub mod template;
pub mod types;
pub mod violation;
