//! File-based control surface
//!
//! Operators steer a running monitor by dropping marker files into a control
//! directory:
//!
//! - `<prefix>.skip.<SYMBOL>` mutes a symbol for a day from its creation
//! - `<prefix>.testcmd.<INDEX>` fires alert command `INDEX` once
//! - `<prefix>.confchange` requests a configuration reload
//!
//! The monitor polls the directory every tick; the CLI writes the markers.

use crate::alerts::MuteEntry;
use crate::error::ControlSignalError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default marker filename prefix
pub const DEFAULT_PREFIX: &str = "TQAlert";

/// Content epochs below this are treated as flags, not timestamps
const MIN_PLAUSIBLE_EPOCH: i64 = 1_000_000_000;

const SKIP_TAG: &str = "skip";
const TESTCMD_TAG: &str = "testcmd";
const CONFCHANGE_TAG: &str = "confchange";

/// Identity of one write of the reload marker
///
/// Stamps are whole seconds, so the mtime tells apart two writes made in
/// the same second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadStamp {
    pub epoch: i64,
    pub modified: Option<SystemTime>,
}

/// Signals collected by one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlSnapshot {
    /// Unexpired mutes
    pub mutes: Vec<MuteEntry>,
    /// Test-fire indexes (0-based), sorted
    pub test_fires: Vec<usize>,
    /// Reload marker timestamp, if the marker exists
    pub reload_stamp: Option<ReloadStamp>,
}

/// Reader and writer for control markers
#[derive(Debug, Clone)]
pub struct ControlSurface {
    dir: PathBuf,
    prefix: String,
    mute_secs: i64,
}

impl ControlSurface {
    /// Create a surface over `dir`
    pub fn new<P: AsRef<Path>>(dir: P, prefix: impl Into<String>, mute_secs: i64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
            mute_secs,
        }
    }

    /// Control directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Mute duration in seconds
    pub fn mute_secs(&self) -> i64 {
        self.mute_secs
    }

    /// Scan the control directory
    ///
    /// Expired mute markers are deleted. Malformed test-fire markers are
    /// deleted and logged. A missing directory yields an empty snapshot.
    pub fn poll(&self, now: i64) -> ControlSnapshot {
        let mut snapshot = ControlSnapshot::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return snapshot,
            Err(e) => {
                log::warn!("Cannot scan control dir {}: {}", self.dir.display(), e);
                return snapshot;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(rest) = name
                .strip_prefix(self.prefix.as_str())
                .and_then(|r| r.strip_prefix('.'))
            else {
                continue;
            };
            let path = entry.path();

            if rest == CONFCHANGE_TAG {
                match marker_stamp(&path) {
                    Ok(epoch) => {
                        snapshot.reload_stamp = Some(ReloadStamp {
                            epoch,
                            modified: fs::metadata(&path).and_then(|m| m.modified()).ok(),
                        })
                    }
                    Err(e) => log::warn!("{}", e),
                }
            } else if let Some(symbol) = rest.strip_prefix(SKIP_TAG).and_then(|r| r.strip_prefix('.')) {
                if let Some(entry) = self.read_mute(&path, symbol, now) {
                    snapshot.mutes.push(entry);
                }
            } else if let Some(index) = rest.strip_prefix(TESTCMD_TAG).and_then(|r| r.strip_prefix('.')) {
                match index.parse::<usize>() {
                    Ok(index) => snapshot.test_fires.push(index),
                    Err(_) => {
                        log::warn!("{}", ControlSignalError::BadIndex(name.to_string()));
                        remove_marker(&path);
                    }
                }
            }
        }

        snapshot.test_fires.sort_unstable();
        snapshot.test_fires.dedup();
        snapshot.mutes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        snapshot
    }

    fn read_mute(&self, path: &Path, symbol: &str, now: i64) -> Option<MuteEntry> {
        if symbol.is_empty() {
            log::warn!("{}", ControlSignalError::BadSymbol(path.display().to_string()));
            return None;
        }

        let created_at = match marker_stamp(path) {
            Ok(stamp) => stamp,
            Err(e) => {
                log::warn!("{}", e);
                return None;
            }
        };

        if now >= created_at.saturating_add(self.mute_secs) {
            log::info!("Mute on {} expired, removing marker", symbol);
            remove_marker(path);
            return None;
        }

        Some(MuteEntry {
            symbol: symbol.to_string(),
            created_at,
        })
    }

    /// Delete the test-fire marker for `index`
    pub fn clear_test_fire(&self, index: usize) {
        remove_marker(&self.marker_path(TESTCMD_TAG, Some(&index.to_string())));
    }

    /// Create a mute marker stamped with `now`
    pub fn mute(&self, symbol: &str, now: i64) -> Result<PathBuf, ControlSignalError> {
        let symbol = sanitize_symbol(symbol)?;
        let path = self.marker_path(SKIP_TAG, Some(&symbol));
        self.write_marker(&path, &now.to_string())?;
        Ok(path)
    }

    /// Remove a mute marker; returns whether one existed
    pub fn unmute(&self, symbol: &str) -> Result<bool, ControlSignalError> {
        let symbol = sanitize_symbol(symbol)?;
        let path = self.marker_path(SKIP_TAG, Some(&symbol));
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ControlSignalError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Request a test-fire of command `index` (0-based)
    pub fn request_test_fire(&self, index: usize) -> Result<PathBuf, ControlSignalError> {
        let path = self.marker_path(TESTCMD_TAG, Some(&index.to_string()));
        self.write_marker(&path, "1")?;
        Ok(path)
    }

    /// Write the reload marker with `now` as its stamp
    pub fn signal_reload(&self, now: i64) -> Result<PathBuf, ControlSignalError> {
        let path = self.marker_path(CONFCHANGE_TAG, None);
        self.write_marker(&path, &now.to_string())?;
        Ok(path)
    }

    fn marker_path(&self, tag: &str, suffix: Option<&str>) -> PathBuf {
        let name = match suffix {
            Some(suffix) => format!("{}.{}.{}", self.prefix, tag, suffix),
            None => format!("{}.{}", self.prefix, tag),
        };
        self.dir.join(name)
    }

    fn write_marker(&self, path: &Path, content: &str) -> Result<(), ControlSignalError> {
        let io_err = |source| ControlSignalError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(path, content).map_err(io_err)
    }
}

/// Make a symbol safe for use in a marker filename
///
/// Path separators, `..`, NUL and line breaks are replaced with `_`.
pub fn sanitize_symbol(symbol: &str) -> Result<String, ControlSignalError> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        return Err(ControlSignalError::BadSymbol(symbol.to_string()));
    }
    let cleaned = trimmed
        .replace("..", "_")
        .replace(['/', '\\', '\0', '\r', '\n'], "_");
    Ok(cleaned)
}

/// Marker timestamp: the content epoch when plausible, else the mtime
fn marker_stamp(path: &Path) -> Result<i64, ControlSignalError> {
    let io_err = |source| ControlSignalError::Io {
        path: path.display().to_string(),
        source,
    };

    let content = fs::read_to_string(path).map_err(io_err)?;
    if let Ok(epoch) = content.trim().parse::<i64>() {
        if epoch > MIN_PLAUSIBLE_EPOCH {
            return Ok(epoch);
        }
    }

    let modified = fs::metadata(path).and_then(|m| m.modified()).map_err(io_err)?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0))
}

fn remove_marker(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            log::warn!("Failed to remove control marker {}: {}", path.display(), e);
        }
    }
}
