//! Time-window rule domain types
//!
//! A rule scopes a pair of staleness thresholds (tick and quote) to a set of
//! weekdays and a time window, which may wrap past midnight.

use super::schedule::{TimeOfDay, WallClock, WeekdayMask, SECONDS_PER_DAY};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of market data whose liveness is monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Trade prints
    Tick,
    /// Bid/ask updates
    Quote,
}

impl DataKind {
    /// Both kinds, in evaluation order
    pub const ALL: [DataKind; 2] = [DataKind::Tick, DataKind::Quote];

    /// Suffix of the activity marker file for this kind
    pub fn marker_suffix(&self) -> &'static str {
        match self {
            Self::Tick => "LastT",
            Self::Quote => "LastQ",
        }
    }

    /// Alert header used when this kind goes stale
    pub fn alert_header(&self) -> &'static str {
        match self {
            Self::Tick => "No Tick Alert",
            Self::Quote => "No Quote Alert",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tick => write!(f, "tick"),
            Self::Quote => write!(f, "quote"),
        }
    }
}

impl FromStr for DataKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tick" | "t" | "lastt" => Ok(Self::Tick),
            "quote" | "q" | "lastq" => Ok(Self::Quote),
            _ => Err(DomainError::UnknownKind(s.to_string())),
        }
    }
}

/// Weekday and time-window scoped staleness thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRule {
    /// Days the rule applies to
    pub weekdays: WeekdayMask,
    /// Window start (inclusive)
    pub begin: TimeOfDay,
    /// Window end (exclusive); before `begin` for sessions crossing midnight
    pub end: TimeOfDay,
    /// Tick staleness threshold in seconds, 0 disables
    pub tick_threshold: u64,
    /// Quote staleness threshold in seconds, 0 disables
    pub quote_threshold: u64,
}

impl TimeRule {
    /// Create a new rule
    pub fn new(
        weekdays: WeekdayMask,
        begin: TimeOfDay,
        end: TimeOfDay,
        tick_threshold: u64,
        quote_threshold: u64,
    ) -> Self {
        Self {
            weekdays,
            begin,
            end,
            tick_threshold,
            quote_threshold,
        }
    }

    /// Whether the window crosses midnight
    pub fn wraps_midnight(&self) -> bool {
        self.begin > self.end
    }

    /// Check whether a time of day falls inside `[begin, end)`
    pub fn contains_time(&self, time: TimeOfDay) -> bool {
        if self.wraps_midnight() {
            time >= self.begin || time < self.end
        } else {
            time >= self.begin && time < self.end
        }
    }

    /// Check whether the rule is active at the given clock
    pub fn matches(&self, clock: &WallClock) -> bool {
        self.weekdays.contains(clock.weekday) && self.contains_time(clock.time)
    }

    /// Seconds elapsed since the window opened, assuming `time` is inside it
    pub fn seconds_since_open(&self, time: TimeOfDay) -> u32 {
        let now = time.as_seconds();
        let begin = self.begin.as_seconds();
        if now >= begin {
            now - begin
        } else {
            SECONDS_PER_DAY - begin + now
        }
    }

    /// Threshold for a kind, `None` when that kind is not monitored
    pub fn threshold(&self, kind: DataKind) -> Option<u64> {
        let secs = match kind {
            DataKind::Tick => self.tick_threshold,
            DataKind::Quote => self.quote_threshold,
        };
        (secs > 0).then_some(secs)
    }

    /// Kinds monitored by this rule
    pub fn monitored_kinds(&self) -> impl Iterator<Item = (DataKind, u64)> + '_ {
        DataKind::ALL
            .into_iter()
            .filter_map(move |kind| self.threshold(kind).map(|secs| (kind, secs)))
    }
}

impl fmt::Display for TimeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}-{} tick={}s quote={}s",
            self.weekdays, self.begin, self.end, self.tick_threshold, self.quote_threshold
        )
    }
}
