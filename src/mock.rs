//! Mock implementations for testing
//!
//! Provides an in-memory store, a settable activity probe and a runner that
//! records command lines instead of executing them.

use crate::alerts::CommandRunner;
use crate::domain::DataKind;
use crate::error::{DispatchError, ProbeError, StoreError};
use crate::probe::ActivityProbe;
use crate::store::ConfigStore;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

/// Mock activity probe
#[derive(Debug, Default)]
pub struct MockProbe {
    markers: RwLock<HashMap<(String, DataKind), i64>>,
}

impl MockProbe {
    /// Set the last activity of a pair
    pub fn set(&self, symbol: &str, kind: DataKind, epoch: i64) {
        self.markers
            .write()
            .unwrap()
            .insert((symbol.to_string(), kind), epoch);
    }

    /// Remove a marker
    pub fn clear(&self, symbol: &str, kind: DataKind) {
        self.markers
            .write()
            .unwrap()
            .remove(&(symbol.to_string(), kind));
    }
}

impl ActivityProbe for MockProbe {
    fn last_activity(&self, symbol: &str, kind: DataKind) -> Result<i64, ProbeError> {
        self.markers
            .read()
            .unwrap()
            .get(&(symbol.to_string(), kind))
            .copied()
            .ok_or_else(|| ProbeError::Missing(format!("{}.{}", symbol, kind.marker_suffix())))
    }
}

/// In-memory configuration store; clones share contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a store holding one record
    pub fn with_record(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.put(key, value);
        store
    }

    /// Replace a record
    pub fn put(&self, key: &str, value: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Make every operation fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                path: "memory".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "store offline"),
            });
        }
        Ok(())
    }
}

impl ConfigStore for MemoryStore {
    fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.put(key, value);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory store".to_string()
    }
}

/// Runner that records every command line
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl RecordingRunner {
    /// Runner that sleeps for `delay` on every run
    pub fn blocking(delay: Duration) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            delay: Some(delay),
        }
    }

    /// Command lines run so far
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command_line: &str) -> Result<(), DispatchError> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.commands.lock().unwrap().push(command_line.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_probe() {
        let probe = MockProbe::default();
        assert!(probe.last_seen("AAPL", DataKind::Tick).is_none());
        probe.set("AAPL", DataKind::Tick, 42);
        assert_eq!(probe.last_seen("AAPL", DataKind::Tick), Some(42));
        probe.clear("AAPL", DataKind::Tick);
        assert!(matches!(
            probe.last_activity("AAPL", DataKind::Tick),
            Err(ProbeError::Missing(_))
        ));
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryStore::default();
        let other = store.clone();
        other.store("tqconf", "{}").unwrap();
        assert_eq!(store.fetch("tqconf").unwrap().as_deref(), Some("{}"));
        store.set_unavailable(true);
        assert!(other.fetch("tqconf").is_err());
    }
}
