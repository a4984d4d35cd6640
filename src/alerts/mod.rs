//! Alert dispatch
//!
//! Renders alert command templates and hands them to a bounded worker pool,
//! honouring per-symbol mutes.

mod dispatcher;
mod mute;
mod runner;
mod types;

pub use dispatcher::{AlertDispatcher, DispatchOutcome, DispatcherConfig};
pub use mute::{MuteEntry, MuteTable, DEFAULT_MUTE_SECS};
pub use runner::{CommandRunner, DryRunRunner, ShellRunner};
pub use types::{Alert, AlertDecision};
