//! Status command implementation
//!
//! Shows, per configured symbol, which rule is active now and how old its
//! activity markers are.

use crate::alerts::MuteTable;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, StatusReport, SymbolStatus};
use crate::commands::{control_surface, load_rules};
use crate::config::Settings;
use crate::domain::{DataKind, WallClock};
use crate::error::Result;
use crate::probe::{ActivityProbe, FileProbe};
use crate::rules::RuleSet;
use crate::store::DirStore;

/// Execute the status command
pub fn run_status(settings: &Settings, format: OutputFormat) -> Result<()> {
    let store = DirStore::open(&settings.store.dir)?;
    let rules = load_rules(&store, &settings.store.key)?;
    let probe = FileProbe::new(&settings.paths.marker_dir);
    let control = control_surface(settings);
    let clock = WallClock::now(settings.general.utc);

    let signals = control.poll(clock.epoch);
    let mutes = MuteTable::from_entries(&signals.mutes, control.mute_secs());

    let report = build_status(&rules, &probe, &mutes, &clock);
    print_output(&report, format)?;
    Ok(())
}

/// Snapshot the staleness of every configured symbol
pub fn build_status<P: ActivityProbe + ?Sized>(
    rules: &RuleSet,
    probe: &P,
    mutes: &MuteTable,
    clock: &WallClock,
) -> StatusReport {
    let symbols = rules
        .symbols()
        .map(|symbol| {
            let active = rules.active_rule(symbol, clock);
            let age = |kind| probe.last_seen(symbol, kind).map(|at| clock.epoch - at);
            let threshold = |kind| active.and_then(|(_, rule)| rule.threshold(kind));

            SymbolStatus {
                symbol: symbol.to_string(),
                active_rule: active.map(|(idx, _)| idx + 1),
                tick_age_secs: age(DataKind::Tick),
                tick_threshold: threshold(DataKind::Tick),
                quote_age_secs: age(DataKind::Quote),
                quote_threshold: threshold(DataKind::Quote),
                muted_until: mutes.muted_until(symbol, clock.epoch),
            }
        })
        .collect();

    StatusReport {
        time: clock.to_string(),
        symbols,
    }
}
