//! Integration tests for the monitor with on-disk markers
//!
//! Drives full ticks against a directory store, real activity marker files
//! and real control markers, recording the command lines that would run.

use chrono::Weekday;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tqalert::alerts::{AlertDispatcher, CommandRunner, DispatcherConfig, DEFAULT_MUTE_SECS};
use tqalert::control::{ControlSurface, DEFAULT_PREFIX};
use tqalert::domain::{DataKind, TimeOfDay, WallClock};
use tqalert::error::DispatchError;
use tqalert::probe::FileProbe;
use tqalert::services::{Monitor, MonitorConfig};
use tqalert::store::{ConfigStore, DirStore};

const T0: i64 = 1_700_000_000;

const RECORD: &str = r##"{
    "TimeRule": {
        "AAPL": [["1111100", 93000, 160000, 60, 30]],
        "ES": [["1111111", 180000, 170000, 45, 0]]
    },
    "AlertCMD": [
        "notify '{HEADER}' \"{BODY}\"",
        "#mail -s {HEADER} ops",
        "page {HEADER}"
    ]
}"##;

#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    fn lines(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap().clone();
        lines.sort();
        lines
    }
}

impl CommandRunner for Recorder {
    fn run(&self, command_line: &str) -> Result<(), DispatchError> {
        self.lines.lock().unwrap().push(command_line.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

struct Fixture {
    _root: TempDir,
    store: DirStore,
    control: ControlSurface,
    markers: std::path::PathBuf,
    recorder: Arc<Recorder>,
}

impl Fixture {
    fn new(record: &str) -> Self {
        let root = TempDir::new().unwrap();
        let store = DirStore::create(root.path().join("store")).unwrap();
        store.store("tqconf", record).unwrap();
        let markers = root.path().join("lastTQ");
        fs::create_dir_all(&markers).unwrap();
        let control = ControlSurface::new(root.path().join("control"), DEFAULT_PREFIX, DEFAULT_MUTE_SECS);

        Self {
            _root: root,
            store,
            control,
            markers,
            recorder: Arc::new(Recorder::default()),
        }
    }

    fn marker(&self, symbol: &str, kind: DataKind, epoch: i64) {
        write(
            &self.markers.join(format!("{}.{}", symbol, kind.marker_suffix())),
            epoch,
        );
    }

    fn monitor(&self) -> Monitor<DirStore, FileProbe> {
        let dispatcher = AlertDispatcher::new(DispatcherConfig::default(), self.recorder.clone());
        let mut monitor = Monitor::new(
            MonitorConfig::default(),
            self.store.clone(),
            FileProbe::new(&self.markers),
            self.control.clone(),
            dispatcher,
            T0,
        );
        monitor.start(T0).unwrap();
        monitor
    }
}

fn write(path: &Path, epoch: i64) {
    fs::write(path, format!("{}\n", epoch)).unwrap();
}

fn at(weekday: Weekday, hhmmss: u64, epoch: i64) -> WallClock {
    WallClock::at(epoch, weekday, TimeOfDay::from_hhmmss(hhmmss).unwrap())
}

#[test]
fn test_stale_tick_runs_every_enabled_command() {
    let fx = Fixture::new(RECORD);
    fx.marker("AAPL", DataKind::Tick, T0 - 540);
    fx.marker("AAPL", DataKind::Quote, T0 - 20);
    fx.marker("ES", DataKind::Tick, T0);

    let mut monitor = fx.monitor();
    let report = monitor.tick(&at(Weekday::Wed, 100000, T0));
    assert_eq!(report.decisions.len(), 1);
    assert!(monitor.shutdown());

    assert_eq!(
        fx.recorder.lines(),
        vec![
            "notify 'No Tick Alert' \"AAPL has no tick for 60 seconds! (last seen 540s ago)\""
                .to_string(),
            "page No Tick Alert".to_string(),
        ]
    );
}

#[test]
fn test_outside_window_nothing_runs() {
    let fx = Fixture::new(RECORD);
    fx.marker("ES", DataKind::Tick, T0);

    let mut monitor = fx.monitor();
    // 17:00 is after the AAPL close and inside the ES maintenance gap
    let report = monitor.tick(&at(Weekday::Wed, 170000, T0));
    assert!(report.decisions.is_empty());
    assert!(monitor.shutdown());
    assert!(fx.recorder.lines().is_empty());
}

#[test]
fn test_wraparound_window() {
    let fx = Fixture::new(RECORD);
    fx.marker("AAPL", DataKind::Tick, T0);
    fx.marker("AAPL", DataKind::Quote, T0);
    fx.marker("ES", DataKind::Tick, T0 - 100);

    let mut monitor = fx.monitor();
    let late = monitor.tick(&at(Weekday::Sun, 230000, T0));
    assert_eq!(late.decisions.len(), 1);
    assert_eq!(late.decisions[0].symbol, "ES");

    // Evening session rolls past midnight; new breach after the marker moves
    fx.marker("ES", DataKind::Tick, T0 + 3_600);
    let early = monitor.tick(&at(Weekday::Mon, 10000, T0 + 7_200));
    assert_eq!(early.decisions.len(), 1);
    assert!(monitor.shutdown());
}

#[test]
fn test_muted_symbol_is_silent_for_a_day() {
    let fx = Fixture::new(RECORD);
    fx.marker("AAPL", DataKind::Tick, T0 - 600);
    fx.marker("AAPL", DataKind::Quote, T0 + 200_000);
    fx.marker("ES", DataKind::Tick, T0 + 200_000);
    fx.control.mute("AAPL", T0).unwrap();

    let mut monitor = fx.monitor();
    let report = monitor.tick(&at(Weekday::Wed, 100000, T0 + 60));
    assert!(report.decisions.is_empty());
    assert_eq!(report.muted, 1);
    assert!(fx.recorder.lines().is_empty());

    let report = monitor.tick(&at(Weekday::Thu, 95959, T0 + DEFAULT_MUTE_SECS - 1));
    assert_eq!(report.muted, 1);
    assert!(report.decisions.is_empty());

    // Same monitor, same dead feed: reported as soon as the mute expires
    let report = monitor.tick(&at(Weekday::Thu, 100100, T0 + DEFAULT_MUTE_SECS + 60));
    assert_eq!(report.muted, 0);
    assert_eq!(report.decisions.len(), 1);
    assert_eq!(report.dispatched, 2);
    assert!(fx.control.poll(T0 + DEFAULT_MUTE_SECS + 60).mutes.is_empty());

    // Once per breach afterwards
    let report = monitor.tick(&at(Weekday::Thu, 101100, T0 + DEFAULT_MUTE_SECS + 660));
    assert!(report.decisions.is_empty());
    assert!(monitor.shutdown());

    assert_eq!(
        fx.recorder.lines(),
        vec![
            "notify 'No Tick Alert' \"AAPL has no tick for 60 seconds! (last seen 87060s ago)\""
                .to_string(),
            "page No Tick Alert".to_string(),
        ]
    );
}

#[test]
fn test_unmute_reports_persisting_outage() {
    let fx = Fixture::new(RECORD);
    fx.marker("AAPL", DataKind::Tick, T0 - 600);
    fx.marker("AAPL", DataKind::Quote, T0 + 200_000);
    fx.marker("ES", DataKind::Tick, T0 + 200_000);
    fx.control.mute("AAPL", T0).unwrap();

    let mut monitor = fx.monitor();
    let report = monitor.tick(&at(Weekday::Wed, 100000, T0 + 60));
    assert!(report.decisions.is_empty());
    assert_eq!(report.muted, 1);

    assert!(fx.control.unmute("AAPL").unwrap());
    let report = monitor.tick(&at(Weekday::Wed, 100500, T0 + 360));
    assert_eq!(report.muted, 0);
    assert_eq!(report.dispatched, 2);
    assert!(monitor.shutdown());
    assert_eq!(fx.recorder.lines().len(), 2);
}

#[test]
fn test_test_fire_runs_one_command_despite_mute() {
    let fx = Fixture::new(RECORD);
    fx.marker("ES", DataKind::Tick, T0 + 100_000);
    fx.control.mute("AAPL", T0).unwrap();
    fx.control.request_test_fire(2).unwrap();

    let mut monitor = fx.monitor();
    // Saturday, outside every AAPL window
    let report = monitor.tick(&at(Weekday::Sat, 120000, T0 + 10));
    assert_eq!(report.test_fires, 1);

    // Marker consumed
    let report = monitor.tick(&at(Weekday::Sat, 120005, T0 + 15));
    assert_eq!(report.test_fires, 0);
    assert!(monitor.shutdown());

    assert_eq!(fx.recorder.lines(), vec!["page !!TEST!!".to_string()]);
}

#[test]
fn test_disabled_command_never_runs() {
    let fx = Fixture::new(RECORD);
    fx.marker("ES", DataKind::Tick, T0 + 100_000);
    fx.control.request_test_fire(1).unwrap();
    fx.control.request_test_fire(7).unwrap();

    let mut monitor = fx.monitor();
    let report = monitor.tick(&at(Weekday::Sat, 120000, T0));
    assert_eq!(report.test_fires, 2);
    assert!(monitor.shutdown());

    assert!(fx.recorder.lines().is_empty());
    assert!(fx.control.poll(T0).test_fires.is_empty());
}

#[test]
fn test_reload_from_store() {
    let fx = Fixture::new(RECORD);
    fx.marker("AAPL", DataKind::Tick, T0 - 540);
    fx.marker("AAPL", DataKind::Quote, T0 + 100_000);
    fx.marker("ES", DataKind::Tick, T0 + 100_000);

    let mut monitor = fx.monitor();
    assert_eq!(monitor.tick(&at(Weekday::Wed, 100000, T0)).dispatched, 2);

    fx.store
        .store(
            "tqconf",
            r#"{"TimeRule": {"AAPL": [["1111100", 93000, 160000, 600, 0]]}, "AlertCMD": ["only {BODY}"]}"#,
        )
        .unwrap();
    fx.control.signal_reload(T0 + 30).unwrap();

    let report = monitor.tick(&at(Weekday::Wed, 100040, T0 + 40));
    assert_eq!(report.reloaded, Some(true));
    // 580s old tick is within the new 600s threshold
    assert!(report.decisions.is_empty());

    let report = monitor.tick(&at(Weekday::Wed, 100200, T0 + 120));
    assert_eq!(report.reloaded, None);
    assert_eq!(report.dispatched, 1);
    assert!(monitor.shutdown());

    assert!(fx
        .recorder
        .lines()
        .contains(&"only AAPL has no tick for 600 seconds! (last seen 660s ago)".to_string()));
}

#[test]
fn test_rejected_reload_keeps_rules() {
    let fx = Fixture::new(RECORD);
    let mut monitor = fx.monitor();

    fx.store.store("tqconf", "{not json").unwrap();
    fx.control.signal_reload(T0 + 30).unwrap();

    let report = monitor.tick(&at(Weekday::Wed, 100040, T0 + 40));
    assert_eq!(report.reloaded, Some(false));
    assert_eq!(monitor.rules().symbol_count(), 2);
    assert!(monitor.shutdown());
}
