//! Allocation and priority-score economy for a single shared vacation property.
//!
//! Households spend their priority score to book stays, battle over overlapping
//! pending requests with it, and lose it to late cancellations or dirty
//! condition reports. The [`stays`] module holds the engine; [`config`],
//! [`telemetry`] and [`error`] carry the service plumbing around it.

pub mod config;
pub mod error;
pub mod stays;
pub mod telemetry;
