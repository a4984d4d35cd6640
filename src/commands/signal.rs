//! Control marker commands
//!
//! Mute, unmute, test-fire and reload requests are written as marker files
//! the running monitor picks up on its next tick.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, Message};
use crate::commands::{control_surface, load_rules, now_epoch};
use crate::config::Settings;
use crate::error::{AppError, ControlSignalError, Result};
use crate::store::DirStore;

/// Execute the mute command
pub fn run_mute(symbols: &[String], settings: &Settings, format: OutputFormat) -> Result<()> {
    let control = control_surface(settings);
    let now = now_epoch();
    let hours = settings.alerts.mute_hours;

    for symbol in symbols {
        let path = control.mute(symbol, now)?;
        log::debug!("Wrote {}", path.display());
        print_output(
            &Message {
                message: format!("Muted {} for {} hour(s)", symbol, hours),
                success: true,
            },
            format,
        )?;
    }

    Ok(())
}

/// Execute the unmute command
pub fn run_unmute(symbols: &[String], settings: &Settings, format: OutputFormat) -> Result<()> {
    let control = control_surface(settings);

    for symbol in symbols {
        let removed = control.unmute(symbol)?;
        let message = if removed {
            format!("Unmuted {}", symbol)
        } else {
            format!("{} was not muted", symbol)
        };
        print_output(
            &Message {
                message,
                success: removed,
            },
            format,
        )?;
    }

    Ok(())
}

/// Execute the test command
///
/// The index is checked against the stored record when the store is
/// reachable; otherwise the marker is written unchecked.
pub fn run_test(index: usize, settings: &Settings, format: OutputFormat) -> Result<()> {
    let stored = DirStore::open(&settings.store.dir)
        .map_err(AppError::from)
        .and_then(|store| load_rules(&store, &settings.store.key));

    match stored {
        Ok(rules) => {
            let count = rules.commands().len();
            if index >= count {
                return Err(ControlSignalError::IndexOutOfRange { index, count }.into());
            }
            if rules.command(index).is_some_and(|cmd| !cmd.is_enabled()) {
                log::warn!("cmd#{} is disabled; the monitor will skip it", index + 1);
            }
        }
        Err(e) => log::warn!("Cannot verify command index: {}", e),
    }

    let control = control_surface(settings);
    let path = control.request_test_fire(index)?;
    log::debug!("Wrote {}", path.display());

    print_output(
        &Message {
            message: format!("Test-fire of cmd#{} requested", index + 1),
            success: true,
        },
        format,
    )?;
    Ok(())
}

/// Execute the reload command
pub fn run_reload(settings: &Settings, format: OutputFormat) -> Result<()> {
    let control = control_surface(settings);
    let path = control.signal_reload(now_epoch())?;
    log::debug!("Wrote {}", path.display());

    print_output(
        &Message {
            message: "Reload requested".to_string(),
            success: true,
        },
        format,
    )?;
    Ok(())
}
