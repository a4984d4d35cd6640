//! Alert command execution
//!
//! Provides the channels that actually run rendered alert commands.

use crate::error::DispatchError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const WAIT_POLL: Duration = Duration::from_millis(50);

/// Executes rendered alert command lines
pub trait CommandRunner: Send + Sync {
    /// Run a command line to completion
    fn run(&self, command_line: &str) -> Result<(), DispatchError>;

    /// Runner name for identification
    fn name(&self) -> &str;
}

/// Runs commands through `<shell> -c`, killing them after a timeout
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
    timeout: Duration,
}

impl ShellRunner {
    /// Create a runner using `shell`
    pub fn new<P: AsRef<Path>>(shell: P, timeout: Duration) -> Self {
        Self {
            shell: shell.as_ref().to_path_buf(),
            timeout,
        }
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("/bin/sh", Duration::from_secs(60))
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str) -> Result<(), DispatchError> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| DispatchError::Spawn {
                command: command_line.to_string(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(DispatchError::ExitStatus {
                        command: command_line.to_string(),
                        status: status.to_string(),
                    })
                }
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill timed out alert command: {}", e);
                    }
                    let _ = child.wait();
                    return Err(DispatchError::Timeout {
                        command: command_line.to_string(),
                        secs: self.timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(WAIT_POLL),
                Err(source) => {
                    return Err(DispatchError::Spawn {
                        command: command_line.to_string(),
                        source,
                    })
                }
            }
        }
    }

    fn name(&self) -> &str {
        "shell"
    }
}

/// Logs commands instead of running them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, command_line: &str) -> Result<(), DispatchError> {
        log::info!("[DRY RUN] Would run: {}", command_line);
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
