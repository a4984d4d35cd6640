//! Service layer for liveness monitoring
//!
//! Services encapsulate the staleness evaluation policy and the monitor loop
//! that drives it.

pub mod evaluator;
pub mod monitor;

pub use evaluator::{Evaluator, EvaluatorConfig};
pub use monitor::{tick_interval, Monitor, MonitorConfig, TickReport};
