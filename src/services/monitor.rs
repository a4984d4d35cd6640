//! Liveness monitor
//!
//! Drives the periodic tick: poll control markers, reload the rule set when
//! asked, run test-fires, evaluate staleness and dispatch alerts.

use crate::alerts::{Alert, AlertDecision, AlertDispatcher, DispatchOutcome, MuteTable};
use crate::control::{ControlSurface, ReloadStamp};
use crate::domain::WallClock;
use crate::error::AppError;
use crate::probe::ActivityProbe;
use crate::rules::{parse_record, RuleSet, SharedRuleSet};
use crate::services::evaluator::{Evaluator, EvaluatorConfig};
use crate::store::ConfigStore;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SLEEP_STEP: Duration = Duration::from_millis(100);

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Fixed interval between ticks
    pub interval: Duration,
    /// Derive the interval from the GCD of configured thresholds
    pub interval_from_thresholds: bool,
    /// Whether to exit after one tick
    pub single_use: bool,
    /// Resolve wall-clock time in UTC instead of local time
    pub utc: bool,
    /// Store key of the configuration record
    pub record_key: String,
    /// Staleness policy
    pub evaluator: EvaluatorConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            interval_from_thresholds: false,
            single_use: false,
            utc: false,
            record_key: "tqconf".to_string(),
            evaluator: EvaluatorConfig::default(),
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Breaches found this tick
    pub decisions: Vec<AlertDecision>,
    /// Command runs queued for breaches
    pub dispatched: usize,
    /// In-window symbols skipped because they are muted
    pub muted: usize,
    /// Test-fire markers consumed
    pub test_fires: usize,
    /// Reload outcome, when a reload was requested
    pub reloaded: Option<bool>,
}

/// Tick interval: fixed, or the threshold GCD capped by the fixed interval
pub fn tick_interval(fixed: Duration, threshold_gcd: Option<u64>, from_thresholds: bool) -> Duration {
    let fixed = fixed.max(Duration::from_secs(1));
    match threshold_gcd {
        Some(gcd) if from_thresholds => Duration::from_secs(gcd.max(1)).min(fixed),
        _ => fixed,
    }
}

/// Liveness monitor
pub struct Monitor<S: ConfigStore, P: ActivityProbe> {
    config: MonitorConfig,
    store: S,
    probe: P,
    control: ControlSurface,
    rules: SharedRuleSet,
    evaluator: Evaluator,
    dispatcher: AlertDispatcher,
    loaded_at: i64,
    consumed: Option<ReloadStamp>,
    running: Arc<AtomicBool>,
}

impl<S: ConfigStore, P: ActivityProbe> Monitor<S, P> {
    /// Create a monitor; no rules are loaded until [`start`](Self::start)
    pub fn new(
        config: MonitorConfig,
        store: S,
        probe: P,
        control: ControlSurface,
        dispatcher: AlertDispatcher,
        now: i64,
    ) -> Self {
        let evaluator = Evaluator::new(config.evaluator.clone(), now);
        Self {
            config,
            store,
            probe,
            control,
            rules: SharedRuleSet::default(),
            evaluator,
            dispatcher,
            loaded_at: now,
            consumed: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Load the initial rule set
    ///
    /// A missing or malformed record is logged and the monitor keeps an empty
    /// rule set until the next reload. Only a store error is returned.
    pub fn start(&mut self, now: i64) -> Result<(), AppError> {
        log::info!("Loading configuration from {}", self.store.describe());
        match self.load_record() {
            Ok(rules) => {
                rules.log_summary();
                self.rules.publish(rules);
            }
            Err(AppError::Store(e)) => return Err(AppError::Store(e)),
            Err(e) => log::error!("{}; monitoring nothing until reload", e),
        }
        self.loaded_at = now;
        Ok(())
    }

    fn load_record(&self) -> Result<RuleSet, AppError> {
        let key = &self.config.record_key;
        let text = self
            .store
            .fetch(key)?
            .ok_or_else(|| AppError::RecordNotFound(key.clone()))?;
        Ok(parse_record(&text)?)
    }

    /// A marker newer than the last load, or rewritten within its second
    fn reload_due(&self, stamp: &ReloadStamp) -> bool {
        stamp.epoch > self.loaded_at
            || (stamp.epoch == self.loaded_at && self.consumed.as_ref() != Some(stamp))
    }

    fn reload(&mut self, stamp: ReloadStamp) -> bool {
        log::info!("Configuration change signalled (stamp {}), reloading", stamp.epoch);
        self.loaded_at = stamp.epoch;
        self.consumed = Some(stamp);
        match self.load_record() {
            Ok(rules) => {
                rules.log_summary();
                self.rules.publish(rules);
                self.evaluator.reset();
                true
            }
            Err(e) => {
                log::error!("Reload rejected, keeping previous configuration: {}", e);
                false
            }
        }
    }

    /// Execute a single monitor tick
    pub fn tick(&mut self, clock: &WallClock) -> TickReport {
        let mut report = TickReport::default();
        let signals = self.control.poll(clock.epoch);

        if let Some(stamp) = signals.reload_stamp.filter(|s| self.reload_due(s)) {
            report.reloaded = Some(self.reload(stamp));
        }

        let mutes = MuteTable::from_entries(&signals.mutes, self.control.mute_secs());
        self.evaluator.set_mutes(mutes.clone());
        self.dispatcher.set_mutes(mutes);

        let rules = self.rules.snapshot();

        for &index in &signals.test_fires {
            log::info!("Test-fire requested for cmd#{}", index + 1);
            if let Err(e) = self.dispatcher.test_fire(&rules, index) {
                log::warn!("{}", e);
            }
            self.control.clear_test_fire(index);
            report.test_fires += 1;
        }

        report.decisions = self.evaluator.evaluate(&rules, &self.probe, clock);
        report.muted = self.evaluator.muted_count();
        for decision in &report.decisions {
            match self
                .dispatcher
                .dispatch(&rules, &Alert::from(decision), clock.epoch)
            {
                DispatchOutcome::Queued(n) => report.dispatched += n,
                DispatchOutcome::Muted { .. }
                | DispatchOutcome::Disabled
                | DispatchOutcome::NoCommands => {}
            }
        }

        report
    }

    /// Run the monitor loop until stopped
    pub fn run(&mut self) -> Result<(), AppError> {
        log::info!("Monitor running, interval {:?}", self.interval());

        while self.is_running() {
            let started = Instant::now();
            let report = self.tick(&WallClock::now(self.config.utc));
            if !report.decisions.is_empty() {
                log::debug!(
                    "Tick: {} breach(es), {} command run(s) queued, {} muted",
                    report.decisions.len(),
                    report.dispatched,
                    report.muted
                );
            }

            if self.config.single_use {
                log::info!("Single-use mode: exiting after one tick");
                break;
            }

            let deadline = started + self.interval();
            while self.is_running() && Instant::now() < deadline {
                thread::sleep(SLEEP_STEP.min(deadline.saturating_duration_since(Instant::now())));
            }
        }

        Ok(())
    }

    /// Current tick interval
    pub fn interval(&self) -> Duration {
        tick_interval(
            self.config.interval,
            self.rules.snapshot().threshold_gcd(),
            self.config.interval_from_thresholds,
        )
    }

    /// Flag that keeps the loop running; clear it to stop
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Check if the loop should keep running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current rule set
    pub fn rules(&self) -> Arc<RuleSet> {
        self.rules.snapshot()
    }

    /// Staleness state
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Stop the loop and drain the dispatcher
    pub fn shutdown(self) -> bool {
        self.running.store(false, Ordering::SeqCst);
        log::info!("Shutting down, waiting for alert commands");
        self.dispatcher.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{DispatcherConfig, DEFAULT_MUTE_SECS};
    use crate::control::DEFAULT_PREFIX;
    use crate::domain::{DataKind, TimeOfDay};
    use crate::mock::{MemoryStore, MockProbe, RecordingRunner};
    use chrono::Weekday;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000;
    const RECORD: &str = r#"{
        "TimeRule": {"AAPL": [["1111100", 93000, 160000, 60, 30]]},
        "AlertCMD": ["notify {HEADER}: {BODY}"]
    }"#;

    fn monitor(
        dir: &TempDir,
        store: MemoryStore,
        probe: MockProbe,
        runner: &Arc<RecordingRunner>,
    ) -> Monitor<MemoryStore, MockProbe> {
        let control = ControlSurface::new(dir.path(), DEFAULT_PREFIX, DEFAULT_MUTE_SECS);
        let dispatcher = AlertDispatcher::new(DispatcherConfig::default(), runner.clone());
        Monitor::new(MonitorConfig::default(), store, probe, control, dispatcher, T0)
    }

    fn wednesday(epoch: i64) -> WallClock {
        WallClock::at(epoch, Weekday::Wed, TimeOfDay::from_hhmmss(100000).unwrap())
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(!config.single_use);
        assert_eq!(config.record_key, "tqconf");
    }

    #[test]
    fn test_tick_interval() {
        let five = Duration::from_secs(5);
        assert_eq!(tick_interval(five, Some(15), false), five);
        assert_eq!(tick_interval(five, Some(15), true), five);
        assert_eq!(tick_interval(five, Some(3), true), Duration::from_secs(3));
        assert_eq!(tick_interval(five, None, true), five);
        assert_eq!(tick_interval(Duration::ZERO, None, false), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_record_starts_empty() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let mut m = monitor(&dir, MemoryStore::default(), MockProbe::default(), &runner);
        assert!(m.start(T0).is_ok());
        assert_eq!(m.rules().symbol_count(), 0);
        assert!(m.tick(&wednesday(T0)).decisions.is_empty());
    }

    #[test]
    fn test_unreachable_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let store = MemoryStore::default();
        store.set_unavailable(true);
        let mut m = monitor(&dir, store, MockProbe::default(), &runner);
        assert!(matches!(m.start(T0), Err(AppError::Store(_))));
    }

    #[test]
    fn test_tick_dispatches_breach() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let store = MemoryStore::with_record("tqconf", RECORD);
        let probe = MockProbe::default();
        probe.set("AAPL", DataKind::Tick, T0 - 540);
        probe.set("AAPL", DataKind::Quote, T0 - 20);

        let mut m = monitor(&dir, store, probe, &runner);
        m.start(T0).unwrap();
        let report = m.tick(&wednesday(T0));
        assert_eq!(report.decisions.len(), 1);
        assert_eq!(report.dispatched, 1);
        assert!(m.shutdown());

        assert_eq!(
            runner.commands(),
            vec!["notify No Tick Alert: AAPL has no tick for 60 seconds! (last seen 540s ago)"
                .to_string()]
        );
    }

    #[test]
    fn test_reload_swaps_rules_and_clears_state() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let store = MemoryStore::with_record("tqconf", RECORD);
        let probe = MockProbe::default();
        probe.set("AAPL", DataKind::Quote, T0 + 10_000);

        let mut m = monitor(&dir, store.clone(), probe, &runner);
        m.start(T0).unwrap();
        assert_eq!(m.tick(&wednesday(T0)).decisions.len(), 1);
        assert!(m.evaluator().is_stale("AAPL", DataKind::Tick));

        store.put(
            "tqconf",
            r#"{"TimeRule": {"ES": [["1111111", 0, 0, 0, 0]]}, "AlertCMD": []}"#,
        );
        m.control.signal_reload(T0 + 60).unwrap();
        let report = m.tick(&wednesday(T0 + 60));
        assert_eq!(report.reloaded, Some(true));
        assert_eq!(m.evaluator().stale_count(), 0);
        assert!(m.rules().rules_for("AAPL").is_empty());

        // Same stamp does not reload again
        assert_eq!(m.tick(&wednesday(T0 + 65)).reloaded, None);
    }

    #[test]
    fn test_malformed_reload_keeps_previous_rules() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let store = MemoryStore::with_record("tqconf", RECORD);
        let mut m = monitor(&dir, store.clone(), MockProbe::default(), &runner);
        m.start(T0).unwrap();

        store.put("tqconf", r#"{"TimeRule": {"AAPL": [["11111", 0, 0, 1, 1]]}, "AlertCMD": []}"#);
        m.control.signal_reload(T0 + 60).unwrap();
        let report = m.tick(&wednesday(T0 + 60));
        assert_eq!(report.reloaded, Some(false));
        assert_eq!(m.rules().rules_for("AAPL").len(), 1);
    }

    fn set_mtime(path: &std::path::Path, offset: u64) {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(std::time::UNIX_EPOCH + Duration::from_secs(T0 as u64 + offset))
            .unwrap();
    }

    #[test]
    fn test_reload_marker_rewritten_in_same_second() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let store = MemoryStore::with_record("tqconf", RECORD);
        let mut m = monitor(&dir, store.clone(), MockProbe::default(), &runner);
        m.start(T0).unwrap();

        let path = m.control.signal_reload(T0 + 60).unwrap();
        set_mtime(&path, 60);
        assert_eq!(m.tick(&wednesday(T0 + 60)).reloaded, Some(true));

        store.put(
            "tqconf",
            r#"{"TimeRule": {"ES": [["1111111", 0, 0, 0, 0]]}, "AlertCMD": []}"#,
        );
        m.control.signal_reload(T0 + 60).unwrap();
        set_mtime(&path, 61);
        assert_eq!(m.tick(&wednesday(T0 + 61)).reloaded, Some(true));
        assert!(m.rules().rules_for("AAPL").is_empty());

        assert_eq!(m.tick(&wednesday(T0 + 62)).reloaded, None);
    }

    #[test]
    fn test_running_flag_stops_loop() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::default());
        let mut m = monitor(&dir, MemoryStore::default(), MockProbe::default(), &runner);
        m.running_flag().store(false, Ordering::SeqCst);
        assert!(m.run().is_ok());
    }
}
