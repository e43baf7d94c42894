//! Courier domain core.
//!
//! Pure, storage-free building blocks shared by the repository layer, the
//! dispatch engine, and the HTTP surface. This crate has zero internal
//! dependencies so it can be reused by any future worker or CLI tooling.

pub mod channels;
pub mod clock;
pub mod delivery;
pub mod error;
pub mod notification_type;
pub mod quiet_hours;
pub mod recurrence;
pub mod report;
pub mod signature;
pub mod types;
