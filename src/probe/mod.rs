//! Activity markers
//!
//! The feed process writes, per symbol and data kind, a file holding the Unix
//! epoch of the last observed update. The monitor only ever reads them.

use crate::domain::DataKind;
use crate::error::ProbeError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source of last-activity timestamps
pub trait ActivityProbe: Send + Sync {
    /// Epoch seconds of the last activity for `symbol`/`kind`
    fn last_activity(&self, symbol: &str, kind: DataKind) -> Result<i64, ProbeError>;

    /// Like [`last_activity`](Self::last_activity), with every failure
    /// folded into "never seen"
    fn last_seen(&self, symbol: &str, kind: DataKind) -> Option<i64> {
        match self.last_activity(symbol, kind) {
            Ok(epoch) => Some(epoch),
            Err(ProbeError::Missing(_)) => None,
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        }
    }
}

/// Reads `<dir>/<SYMBOL>.LastT` and `<dir>/<SYMBOL>.LastQ`
#[derive(Debug, Clone)]
pub struct FileProbe {
    dir: PathBuf,
}

impl FileProbe {
    /// Create a probe over a marker directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the marker for `symbol`/`kind`
    pub fn marker_path(&self, symbol: &str, kind: DataKind) -> PathBuf {
        self.dir.join(format!("{}.{}", symbol, kind.marker_suffix()))
    }
}

impl ActivityProbe for FileProbe {
    fn last_activity(&self, symbol: &str, kind: DataKind) -> Result<i64, ProbeError> {
        let path = self.marker_path(symbol, kind);
        let display = path.display().to_string();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ProbeError::Missing(display)),
            Err(source) => {
                return Err(ProbeError::Unreadable {
                    path: display,
                    source,
                })
            }
        };

        let first = content.lines().next().unwrap_or("").trim();
        first.parse::<i64>().map_err(|_| ProbeError::Malformed {
            path: display,
            content: first.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_first_line_epoch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.LastT"), "1700000000\nextra\n").unwrap();
        let probe = FileProbe::new(dir.path());
        assert_eq!(
            probe.last_activity("AAPL", DataKind::Tick).unwrap(),
            1_700_000_000
        );
    }

    #[test]
    fn test_missing_marker_is_never_seen() {
        let dir = tempfile::tempdir().unwrap();
        let probe = FileProbe::new(dir.path());
        assert!(matches!(
            probe.last_activity("AAPL", DataKind::Quote),
            Err(ProbeError::Missing(_))
        ));
        assert_eq!(probe.last_seen("AAPL", DataKind::Quote), None);
    }

    #[test]
    fn test_malformed_marker_is_never_seen() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AAPL.LastQ"), "yesterday").unwrap();
        let probe = FileProbe::new(dir.path());
        assert!(matches!(
            probe.last_activity("AAPL", DataKind::Quote),
            Err(ProbeError::Malformed { .. })
        ));
        assert_eq!(probe.last_seen("AAPL", DataKind::Quote), None);
    }
}
