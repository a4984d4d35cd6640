//! Domain models for tqalert
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod rule;
pub mod schedule;

pub use rule::{DataKind, TimeRule};
pub use schedule::{TimeOfDay, WallClock, WeekdayMask, SECONDS_PER_DAY};
