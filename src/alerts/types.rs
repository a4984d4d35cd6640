//! Alert domain types

use crate::domain::DataKind;
use serde::Serialize;
use std::fmt;

/// Header used for test-fire dispatches
pub const TEST_HEADER: &str = "!!TEST!!";

/// A staleness breach detected by the evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertDecision {
    /// Instrument
    pub symbol: String,
    /// Stale data kind
    pub kind: DataKind,
    /// Seconds since the last marker, `None` when never seen
    pub elapsed: Option<u64>,
    /// Threshold of the matching rule
    pub threshold: u64,
    /// Position of the matching rule (0-based)
    pub rule_index: usize,
}

impl AlertDecision {
    /// Alert header, e.g. `No Tick Alert`
    pub fn header(&self) -> String {
        self.kind.alert_header().to_string()
    }

    /// Alert body, e.g. `AAPL has no tick for 60 seconds! (last seen 540s ago)`
    pub fn body(&self) -> String {
        let seen = match self.elapsed {
            Some(secs) => format!("last seen {}s ago", secs),
            None => "never seen".to_string(),
        };
        format!(
            "{} has no {} for {} seconds! ({})",
            self.symbol, self.kind, self.threshold, seen
        )
    }
}

impl fmt::Display for AlertDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!!!{}!!! {}", self.header(), self.body())
    }
}

/// Rendered alert ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Symbol the alert concerns, `None` for test-fires
    pub symbol: Option<String>,
    /// Text substituted for `{HEADER}`
    pub header: String,
    /// Text substituted for `{BODY}`
    pub body: String,
}

impl Alert {
    /// Create an alert for a symbol
    pub fn new(symbol: impl Into<String>, header: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            header: header.into(),
            body: body.into(),
        }
    }

    /// Canned alert used to verify the command at `index`
    pub fn test_fire(index: usize) -> Self {
        Self {
            symbol: None,
            header: TEST_HEADER.to_string(),
            body: format!("Hello, this is test of TQAlert#{}.", index + 1),
        }
    }
}

impl From<&AlertDecision> for Alert {
    fn from(decision: &AlertDecision) -> Self {
        Self::new(decision.symbol.clone(), decision.header(), decision.body())
    }
}
