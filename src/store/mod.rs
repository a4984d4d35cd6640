//! Configuration store adapter
//!
//! The alert configuration lives as a single record in an external
//! key-value store. Values are stored with quotes and backslashes encoded as
//! HTML entities, which is how the web editor writes them; the adapter
//! decodes on read and encodes on write.

use crate::error::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key-value store holding configuration records
pub trait ConfigStore: Send + Sync {
    /// Read the decoded record under `key`, `Ok(None)` when absent
    fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the record under `key`
    fn store(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Human-readable location, for log lines
    fn describe(&self) -> String;
}

/// Encode a record for storage
pub fn escape_value(value: &str) -> String {
    value
        .replace('\\', "&bsol;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Decode a stored record
pub fn unescape_value(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&bsol;", "\\")
}

/// Directory-backed store: one file per key
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`
    ///
    /// Fails when the directory does not exist or cannot be read, which is
    /// the one startup condition that prevents the monitor from running.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::read_dir(&root).map_err(|source| StoreError::Unavailable {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Open a store, creating its directory if needed
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        fs::create_dir_all(root.as_ref())?;
        Self::open(root)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl ConfigStore for DirStore {
    fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(unescape_value(raw.trim_end()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Write-then-rename so a concurrent reader never sees a torn record
        let tmp = self.root.join(format!(".{}.tmp", key));
        fs::write(&tmp, escape_value(value))?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_roundtrip_of_quotes_and_backslashes() {
        let raw = r#"{"AlertCMD": ["printf '%s\n' {BODY}"]}"#;
        let escaped = escape_value(raw);
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert!(!escaped.contains('\\'));
        assert_eq!(unescape_value(&escaped), raw);
    }

    #[test]
    fn test_open_missing_directory_is_unavailable() {
        let result = DirStore::open("/nonexistent/tqalert/store");
        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_store_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        assert_eq!(store.fetch("tqconf").unwrap(), None);

        let record = r#"{"TimeRule": {}, "AlertCMD": ["echo \"{BODY}\""]}"#;
        store.store("tqconf", record).unwrap();
        assert_eq!(store.fetch("tqconf").unwrap().as_deref(), Some(record));

        // On disk the value is entity-encoded
        let on_disk = std::fs::read_to_string(dir.path().join("tqconf")).unwrap();
        assert!(on_disk.contains("&quot;"));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.fetch("../etc/passwd"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.fetch(""), Err(StoreError::InvalidKey(_))));
    }
}
