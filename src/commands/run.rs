//! Run command implementation
//!
//! Starts the liveness monitor and keeps it running until a termination
//! signal arrives.

use crate::alerts::{AlertDispatcher, CommandRunner, DryRunRunner, ShellRunner};
use crate::cli::args::RunArgs;
use crate::commands::{control_surface, now_epoch};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::probe::FileProbe;
use crate::services::Monitor;
use crate::store::DirStore;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Execute the run command
pub fn run_monitor(args: &RunArgs, settings: &Settings) -> Result<()> {
    let store = DirStore::open(&settings.store.dir)?;
    let probe = FileProbe::new(&settings.paths.marker_dir);
    let control = control_surface(settings);

    log::info!("Starting tqalert monitor");
    log::info!("  Store: {} (key {})", settings.store.dir.display(), settings.store.key);
    log::info!("  Markers: {}", settings.paths.marker_dir.display());
    log::info!("  Control: {}", settings.paths.control_dir.display());

    let runner: Arc<dyn CommandRunner> = if settings.general.dry_run {
        Arc::new(DryRunRunner)
    } else {
        let shell = ShellRunner::new(
            &settings.alerts.shell,
            Duration::from_secs(settings.alerts.command_timeout_secs),
        );
        log::info!("  Command timeout: {:?}", shell.timeout());
        Arc::new(shell)
    };

    log::info!("  Runner: {}", runner.name());
    log::debug!("  Settings: {:?}", settings);

    let dispatcher = AlertDispatcher::new(settings.dispatcher_config(), runner);
    let now = now_epoch();
    let mut monitor = Monitor::new(
        settings.monitor_config(args.once),
        store,
        probe,
        control,
        dispatcher,
        now,
    );
    monitor.start(now)?;

    let running = monitor.running_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Signal(e.to_string()))?;

    monitor.run()?;

    if !monitor.shutdown() {
        log::warn!("Some alert commands were still running at exit");
    }
    log::info!("Monitor stopped");
    Ok(())
}
