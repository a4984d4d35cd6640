//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod check;
pub mod record;
pub mod run;
pub mod signal;
pub mod status;

pub use check::run_check;
pub use record::run_config;
pub use run::run_monitor;
pub use signal::{run_mute, run_reload, run_test, run_unmute};
pub use status::run_status;

use crate::config::Settings;
use crate::control::ControlSurface;
use crate::error::{AppError, Result};
use crate::rules::{parse_record, RuleSet};
use crate::store::ConfigStore;

/// Current Unix time in seconds
pub(crate) fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Control surface configured by `settings`
pub(crate) fn control_surface(settings: &Settings) -> ControlSurface {
    ControlSurface::new(
        &settings.paths.control_dir,
        settings.paths.control_prefix.clone(),
        settings.mute_secs(),
    )
}

/// Fetch and parse the configuration record under `key`
pub(crate) fn load_rules<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Result<RuleSet> {
    let text = store
        .fetch(key)?
        .ok_or_else(|| AppError::RecordNotFound(key.to_string()))?;
    Ok(parse_record(&text)?)
}
