//! Schedule domain types
//!
//! Provides validated types for weekday masks, times of day and the
//! wall-clock snapshot a monitor tick is evaluated against.

use crate::error::DomainError;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Set of weekdays, Monday first
///
/// Written as seven `0`/`1` digits, e.g. `1111100` for Monday to Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    /// Monday through Friday
    pub const WEEKDAYS: Self = Self(0b001_1111);
    /// Every day of the week
    pub const ALL: Self = Self(0b111_1111);

    /// Parse a seven-digit mask such as `"1111100"`
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let text = text.trim();
        if text.len() != 7 {
            return Err(DomainError::InvalidWeekdayMask(text.to_string()));
        }

        let mut bits = 0u8;
        for (day, ch) in text.chars().enumerate() {
            match ch {
                '1' => bits |= 1 << day,
                '0' => {}
                _ => return Err(DomainError::InvalidWeekdayMask(text.to_string())),
            }
        }
        Ok(Self(bits))
    }

    /// Parse the integer form, where leading zeros have been lost
    /// (`111110` is `0111110`, Tuesday to Saturday)
    pub fn from_integer(value: u64) -> Result<Self, DomainError> {
        let text = format!("{:07}", value);
        if text.len() != 7 {
            return Err(DomainError::InvalidWeekdayMask(value.to_string()));
        }
        Self::parse(&text)
    }

    /// Check whether a weekday is included
    #[inline]
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_monday()) != 0
    }

    /// Check whether no day is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WeekdayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in 0..7 {
            let digit = if self.0 & (1 << day) != 0 { '1' } else { '0' };
            write!(f, "{}", digit)?;
        }
        Ok(())
    }
}

/// Time of day as seconds since midnight, always below 86400
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// Midnight
    pub const MIDNIGHT: Self = Self(0);

    /// Create from seconds since midnight
    pub fn from_seconds(seconds: u64) -> Result<Self, DomainError> {
        if seconds >= SECONDS_PER_DAY as u64 {
            return Err(DomainError::SecondsOutOfRange(seconds));
        }
        Ok(Self(seconds as u32))
    }

    /// Create from hours, minutes and seconds
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Result<Self, DomainError> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return Err(DomainError::InvalidTimeOfDay(format!(
                "{:02}{:02}{:02}",
                hours, minutes, seconds
            )));
        }
        Ok(Self(hours * 3600 + minutes * 60 + seconds))
    }

    /// Create from the packed `HHMMSS` integer form (`93000` is 09:30:00)
    pub fn from_hhmmss(value: u64) -> Result<Self, DomainError> {
        if value > 235_959 {
            return Err(DomainError::InvalidTimeOfDay(value.to_string()));
        }
        let hours = (value / 10_000) as u32;
        let minutes = ((value / 100) % 100) as u32;
        let seconds = (value % 100) as u32;
        Self::from_hms(hours, minutes, seconds)
            .map_err(|_| DomainError::InvalidTimeOfDay(value.to_string()))
    }

    /// Parse the textual forms: `HHMMSS`, `HH:MM:SS` or `<seconds>s`
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let text = text.trim();
        let invalid = || DomainError::InvalidTimeOfDay(text.to_string());

        if let Some(raw) = text.strip_suffix('s') {
            let seconds: u64 = raw.parse().map_err(|_| invalid())?;
            return Self::from_seconds(seconds);
        }

        if text.contains(':') {
            let parts: Vec<&str> = text.split(':').collect();
            if parts.len() != 3 || parts.iter().any(|p| p.len() != 2) {
                return Err(invalid());
            }
            let mut fields = [0u32; 3];
            for (slot, part) in fields.iter_mut().zip(&parts) {
                *slot = part.parse().map_err(|_| invalid())?;
            }
            return Self::from_hms(fields[0], fields[1], fields[2]).map_err(|_| invalid());
        }

        if text.len() == 6 && text.chars().all(|c| c.is_ascii_digit()) {
            let value: u64 = text.parse().map_err(|_| invalid())?;
            return Self::from_hhmmss(value);
        }

        Err(invalid())
    }

    /// Seconds since midnight
    #[inline]
    pub const fn as_seconds(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.0 / 3600,
            (self.0 / 60) % 60,
            self.0 % 60
        )
    }
}

/// Wall-clock snapshot taken once per monitor tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    /// Unix epoch seconds
    pub epoch: i64,
    /// Day of the week in the monitor's time zone
    pub weekday: Weekday,
    /// Time of day in the monitor's time zone
    pub time: TimeOfDay,
}

impl WallClock {
    /// Resolve a zoned timestamp
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            epoch: dt.timestamp(),
            weekday: dt.weekday(),
            time: TimeOfDay(dt.num_seconds_from_midnight() % SECONDS_PER_DAY),
        }
    }

    /// Current time, local or UTC
    pub fn now(utc: bool) -> Self {
        if utc {
            Self::from_datetime(&Utc::now())
        } else {
            Self::from_datetime(&Local::now())
        }
    }

    /// Build a clock from its parts (mostly useful for tests and dry runs)
    pub fn at(epoch: i64, weekday: Weekday, time: TimeOfDay) -> Self {
        Self {
            epoch,
            weekday,
            time,
        }
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.weekday, self.time, self.epoch)
    }
}
