//! Per-symbol alert muting

use serde::Serialize;
use std::collections::HashMap;

/// Mutes last a day from creation
pub const DEFAULT_MUTE_SECS: i64 = 24 * 3600;

/// A mute observed on the control surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MuteEntry {
    /// Muted symbol
    pub symbol: String,
    /// Epoch seconds the mute was created
    pub created_at: i64,
}

/// Active mutes keyed by symbol, holding expiry instants
#[derive(Debug, Clone, Default)]
pub struct MuteTable {
    expiries: HashMap<String, i64>,
}

impl MuteTable {
    /// Build a table from control-surface entries
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a MuteEntry>, duration_secs: i64) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.mute(&entry.symbol, entry.created_at, duration_secs);
        }
        table
    }

    /// Mute `symbol` for `duration_secs` from `created_at`
    ///
    /// If the symbol is already muted, the later expiry wins.
    pub fn mute(&mut self, symbol: &str, created_at: i64, duration_secs: i64) {
        let expiry = created_at.saturating_add(duration_secs);
        self.expiries
            .entry(symbol.to_string())
            .and_modify(|e| *e = (*e).max(expiry))
            .or_insert(expiry);
    }

    /// Expiry of an unexpired mute on `symbol`
    pub fn muted_until(&self, symbol: &str, now: i64) -> Option<i64> {
        self.expiries
            .get(symbol)
            .copied()
            .filter(|&expiry| now < expiry)
    }

    /// Number of entries, expired or not
    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_expires_after_duration() {
        let mut table = MuteTable::default();
        table.mute("AAPL", 1_000, DEFAULT_MUTE_SECS);

        assert_eq!(table.muted_until("AAPL", 1_000), Some(1_000 + DEFAULT_MUTE_SECS));
        assert!(table.muted_until("AAPL", 1_000 + DEFAULT_MUTE_SECS - 1).is_some());
        assert!(table.muted_until("AAPL", 1_000 + DEFAULT_MUTE_SECS).is_none());
        assert!(table.muted_until("MSFT", 1_000).is_none());
    }

    #[test]
    fn test_later_expiry_wins() {
        let mut table = MuteTable::default();
        table.mute("AAPL", 5_000, 100);
        table.mute("AAPL", 1_000, 100);
        assert_eq!(table.muted_until("AAPL", 5_050), Some(5_100));
    }

    #[test]
    fn test_from_entries_applies_duration() {
        let entries = vec![
            MuteEntry {
                symbol: "AAPL".to_string(),
                created_at: 0,
            },
            MuteEntry {
                symbol: "ES".to_string(),
                created_at: 500,
            },
        ];
        let table = MuteTable::from_entries(&entries, 1_000);
        assert_eq!(table.len(), 2);
        assert!(table.muted_until("AAPL", 1_200).is_none());
        assert_eq!(table.muted_until("ES", 1_200), Some(1_500));
    }
}
