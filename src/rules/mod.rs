//! Alerting rule set
//!
//! An immutable snapshot of the per-symbol time-window rules and the alert
//! command templates. A new snapshot is parsed on every reload and swapped in
//! whole; nothing mutates a published `RuleSet`.

mod command;
mod record;

pub use command::AlertCommand;
pub use record::parse_record;

use crate::domain::{TimeRule, WallClock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Parsed, validated alert configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    rules: BTreeMap<String, Vec<TimeRule>>,
    commands: Vec<AlertCommand>,
}

impl RuleSet {
    /// Create a rule set from already validated parts
    pub fn new(rules: BTreeMap<String, Vec<TimeRule>>, commands: Vec<AlertCommand>) -> Self {
        Self { rules, commands }
    }

    /// Monitored symbols, sorted
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of monitored symbols
    pub fn symbol_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules of a symbol, in evaluation order
    pub fn rules_for(&self, symbol: &str) -> &[TimeRule] {
        self.rules.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First rule of `symbol` active at `clock`, with its position
    pub fn active_rule(&self, symbol: &str, clock: &WallClock) -> Option<(usize, &TimeRule)> {
        self.rules_for(symbol)
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(clock))
    }

    /// Iterate over every symbol with its rules
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TimeRule])> {
        self.rules.iter().map(|(s, r)| (s.as_str(), r.as_slice()))
    }

    /// All alert command templates, including disabled ones
    pub fn commands(&self) -> &[AlertCommand] {
        &self.commands
    }

    /// Alert command at a position of the configured list
    pub fn command(&self, index: usize) -> Option<&AlertCommand> {
        self.commands.get(index)
    }

    /// Commands that are not commented out
    pub fn enabled_commands(&self) -> impl Iterator<Item = &AlertCommand> {
        self.commands.iter().filter(|c| c.is_enabled())
    }

    /// Greatest common divisor of every non-zero threshold
    ///
    /// Returns `None` when no threshold is configured at all.
    pub fn threshold_gcd(&self) -> Option<u64> {
        self.rules
            .values()
            .flatten()
            .flat_map(|rule| [rule.tick_threshold, rule.quote_threshold])
            .filter(|&secs| secs > 0)
            .reduce(gcd)
    }

    /// Log the loaded configuration, one line per rule and command
    pub fn log_summary(&self) {
        log::info!(
            "Loaded {} symbol(s), {} alert command(s)",
            self.rules.len(),
            self.commands.len()
        );
        for (symbol, rules) in &self.rules {
            for (idx, rule) in rules.iter().enumerate() {
                log::info!("  {} rule#{}: {}", symbol, idx + 1, rule);
            }
        }
        for (idx, cmd) in self.commands.iter().enumerate() {
            let state = if cmd.is_enabled() { "" } else { " (disabled)" };
            log::info!("  cmd#{}: [{}]{}", idx + 1, cmd, state);
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Single-writer publication point for the current rule set
///
/// Readers take an `Arc` snapshot and keep it for the whole tick; the writer
/// replaces the pointer, so a reader never sees a half-applied reload.
#[derive(Debug, Clone, Default)]
pub struct SharedRuleSet {
    current: Arc<RwLock<Arc<RuleSet>>>,
}

impl SharedRuleSet {
    /// Publish an initial rule set
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(rules))),
        }
    }

    /// Take a snapshot of the current rule set
    pub fn snapshot(&self) -> Arc<RuleSet> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the current rule set
    pub fn publish(&self, rules: RuleSet) {
        let next = Arc::new(rules);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
