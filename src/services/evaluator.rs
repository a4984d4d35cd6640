//! Staleness evaluator
//!
//! Applies the active rule of every symbol to its activity markers and
//! decides which (symbol, kind) pairs should alert this tick.

use crate::alerts::{AlertDecision, MuteTable};
use crate::domain::{DataKind, WallClock};
use crate::probe::ActivityProbe;
use crate::rules::RuleSet;
use std::collections::HashMap;

/// Evaluation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Hold a kind until its threshold has elapsed since the window opened
    pub open_grace: bool,
    /// Seconds after start during which absent markers are not reported
    pub startup_grace_secs: u64,
    /// Re-fire a persisting breach every N seconds; `None` fires once
    pub realert_interval_secs: Option<u64>,
    /// Minimum seconds between two alerts for the same symbol
    pub min_alert_interval_secs: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            open_grace: true,
            startup_grace_secs: 0,
            realert_interval_secs: None,
            min_alert_interval_secs: 30,
        }
    }
}

/// A fired breach that has not yet recovered
#[derive(Debug, Clone, Copy)]
struct Breach {
    marker_at_fire: Option<i64>,
    fired_at: i64,
}

/// Per-(symbol, kind) staleness state machine
///
/// Muted symbols are skipped before any breach is recorded, so an outage
/// that outlives its mute is reported once the mute ends. Leaving the
/// active window re-arms every pair of the symbol.
pub struct Evaluator {
    config: EvaluatorConfig,
    started_at: i64,
    breaches: HashMap<(String, DataKind), Breach>,
    last_alert: HashMap<String, i64>,
    mutes: MuteTable,
    muted: usize,
}

impl Evaluator {
    /// Create an evaluator; `started_at` anchors the startup grace
    pub fn new(config: EvaluatorConfig, started_at: i64) -> Self {
        Self {
            config,
            started_at,
            breaches: HashMap::new(),
            last_alert: HashMap::new(),
            mutes: MuteTable::default(),
            muted: 0,
        }
    }

    /// Replace the mute table consulted on the next evaluation
    pub fn set_mutes(&mut self, mutes: MuteTable) {
        self.mutes = mutes;
    }

    /// In-window symbols skipped by a mute on the last evaluation
    pub fn muted_count(&self) -> usize {
        self.muted
    }

    /// Evaluate every symbol against `clock`
    pub fn evaluate<P: ActivityProbe + ?Sized>(
        &mut self,
        rules: &RuleSet,
        probe: &P,
        clock: &WallClock,
    ) -> Vec<AlertDecision> {
        let now = clock.epoch;
        let mut decisions = Vec::new();
        self.muted = 0;

        for symbol in rules.symbols() {
            let Some((rule_index, rule)) = rules.active_rule(symbol, clock) else {
                self.rearm(symbol);
                continue;
            };

            if let Some(until) = self.mutes.muted_until(symbol, now) {
                log::debug!("{} muted until {}, not evaluated", symbol, until);
                self.muted += 1;
                continue;
            }

            let cooling_down = self
                .last_alert
                .get(symbol)
                .is_some_and(|&at| now - at < self.config.min_alert_interval_secs as i64);
            let since_open = u64::from(rule.seconds_since_open(clock.time));
            let mut fired = false;

            for (kind, threshold) in rule.monitored_kinds() {
                if self.config.open_grace && since_open < threshold {
                    continue;
                }

                let last = probe.last_seen(symbol, kind);
                if last.is_none()
                    && now - self.started_at < self.config.startup_grace_secs as i64
                {
                    continue;
                }

                let elapsed = last.map(|at| (now - at).max(0) as u64);
                let key = (symbol.to_string(), kind);

                if elapsed.is_some_and(|secs| secs < threshold) {
                    if self.breaches.remove(&key).is_some() {
                        log::info!("{} {} recovered", symbol, kind);
                    }
                    continue;
                }

                if let Some(breach) = self.breaches.get(&key) {
                    let advanced = last > breach.marker_at_fire;
                    let realert_due = self
                        .config
                        .realert_interval_secs
                        .is_some_and(|every| now - breach.fired_at >= every as i64);
                    if !advanced && !realert_due {
                        continue;
                    }
                }

                if cooling_down {
                    log::debug!(
                        "{} {} stale, held by the per-symbol alert interval",
                        symbol,
                        kind
                    );
                    continue;
                }

                let decision = AlertDecision {
                    symbol: symbol.to_string(),
                    kind,
                    elapsed,
                    threshold,
                    rule_index,
                };
                log::info!("{}", decision);
                decisions.push(decision);
                self.breaches.insert(
                    key,
                    Breach {
                        marker_at_fire: last,
                        fired_at: now,
                    },
                );
                fired = true;
            }

            if fired {
                self.last_alert.insert(symbol.to_string(), now);
            }
        }

        decisions
    }

    fn rearm(&mut self, symbol: &str) {
        let before = self.breaches.len();
        self.breaches.retain(|(s, _), _| s.as_str() != symbol);
        if self.breaches.len() != before {
            log::debug!("{} left its window, breaches re-armed", symbol);
        }
    }

    /// Forget all staleness state
    pub fn reset(&mut self) {
        self.breaches.clear();
        self.last_alert.clear();
    }

    /// Check whether a pair has fired and not yet recovered
    pub fn is_stale(&self, symbol: &str, kind: DataKind) -> bool {
        self.breaches.contains_key(&(symbol.to_string(), kind))
    }

    /// Number of pairs currently stale
    pub fn stale_count(&self) -> usize {
        self.breaches.len()
    }
}
