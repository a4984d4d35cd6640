//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::TimeRule;
use crate::rules::RuleSet;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// One configured rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleEntry {
    pub symbol: String,
    pub index: usize,
    pub rule: TimeRule,
}

/// One configured alert command
#[derive(Debug, Clone, Serialize)]
pub struct CommandEntry {
    pub index: usize,
    pub template: String,
    pub enabled: bool,
}

/// Validated rule set for display
#[derive(Debug, Clone, Serialize)]
pub struct RuleListing {
    pub source: String,
    pub rules: Vec<RuleEntry>,
    pub commands: Vec<CommandEntry>,
}

impl RuleListing {
    /// Flatten a rule set for display
    pub fn new(source: impl Into<String>, rules: &RuleSet) -> Self {
        let entries = rules
            .iter()
            .flat_map(|(symbol, list)| {
                list.iter().enumerate().map(move |(idx, rule)| RuleEntry {
                    symbol: symbol.to_string(),
                    index: idx + 1,
                    rule: *rule,
                })
            })
            .collect();

        let commands = rules
            .commands()
            .iter()
            .enumerate()
            .map(|(idx, cmd)| CommandEntry {
                index: idx,
                template: cmd.template().to_string(),
                enabled: cmd.is_enabled(),
            })
            .collect();

        Self {
            source: source.into(),
            rules: entries,
            commands,
        }
    }
}

impl TableDisplay for RuleListing {
    fn to_table(&self) -> String {
        let mut output = format!("Source: {}\n", self.source);
        output.push_str(&format!("Rules: {}\n\n", self.rules.len()));

        output.push_str("  Symbol       #   Days     Window               Tick   Quote\n");
        output.push_str("  ────────────────────────────────────────────────────────────\n");
        for entry in &self.rules {
            output.push_str(&format!(
                "  {:<12} {:<3} {}  {} - {}  {:>5}  {:>5}\n",
                entry.symbol,
                entry.index,
                entry.rule.weekdays,
                entry.rule.begin,
                entry.rule.end,
                entry.rule.tick_threshold,
                entry.rule.quote_threshold
            ));
        }

        output.push_str(&format!("\nAlert commands: {}\n", self.commands.len()));
        for cmd in &self.commands {
            let state = if cmd.enabled { "" } else { " (disabled)" };
            output.push_str(&format!("  [{}] {}{}\n", cmd.index, cmd.template, state));
        }

        output
    }

    fn to_compact(&self) -> String {
        let symbols = self
            .rules
            .iter()
            .map(|r| r.symbol.as_str())
            .collect::<std::collections::BTreeSet<_>>();
        format!(
            "{} symbols, {} rules, {} commands ({} enabled)",
            symbols.len(),
            self.rules.len(),
            self.commands.len(),
            self.commands.iter().filter(|c| c.enabled).count()
        )
    }
}

/// Staleness of one symbol right now
#[derive(Debug, Clone, Serialize)]
pub struct SymbolStatus {
    pub symbol: String,
    /// Matching rule (1-based), `None` outside every window
    pub active_rule: Option<usize>,
    pub tick_age_secs: Option<i64>,
    pub tick_threshold: Option<u64>,
    pub quote_age_secs: Option<i64>,
    pub quote_threshold: Option<u64>,
    pub muted_until: Option<i64>,
}

impl SymbolStatus {
    /// Whether a monitored kind is past its threshold
    pub fn is_stale(&self) -> bool {
        let stale = |age: Option<i64>, threshold: Option<u64>| match (age, threshold) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(age), Some(t)) => age >= t as i64,
        };
        self.active_rule.is_some()
            && (stale(self.tick_age_secs, self.tick_threshold)
                || stale(self.quote_age_secs, self.quote_threshold))
    }
}

/// Status of every configured symbol
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub time: String,
    pub symbols: Vec<SymbolStatus>,
}

fn age_cell(age: Option<i64>, threshold: Option<u64>) -> String {
    match (age, threshold) {
        (_, None) => "-".to_string(),
        (None, Some(t)) => format!("never/{}s", t),
        (Some(age), Some(t)) => format!("{}s/{}s", age, t),
    }
}

impl TableDisplay for StatusReport {
    fn to_table(&self) -> String {
        let mut output = format!("Time: {}\n\n", self.time);
        if self.symbols.is_empty() {
            output.push_str("  No symbols configured\n");
            return output;
        }

        output.push_str("  Symbol       Rule  Tick             Quote            State\n");
        output.push_str("  ────────────────────────────────────────────────────────────\n");
        for s in &self.symbols {
            let rule = s
                .active_rule
                .map(|r| format!("#{}", r))
                .unwrap_or_else(|| "-".to_string());
            let state = if s.muted_until.is_some() {
                "MUTED"
            } else if s.active_rule.is_none() {
                "idle"
            } else if s.is_stale() {
                "STALE"
            } else {
                "ok"
            };
            output.push_str(&format!(
                "  {:<12} {:<5} {:<16} {:<16} {}\n",
                s.symbol,
                rule,
                age_cell(s.tick_age_secs, s.tick_threshold),
                age_cell(s.quote_age_secs, s.quote_threshold),
                state
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        let stale = self.symbols.iter().filter(|s| s.is_stale()).count();
        let active = self
            .symbols
            .iter()
            .filter(|s| s.active_rule.is_some())
            .count();
        format!(
            "{} symbols, {} in window, {} stale",
            self.symbols.len(),
            active,
            stale
        )
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}
