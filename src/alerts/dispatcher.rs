//! Alert dispatcher
//!
//! Checks mutes, renders the enabled command templates and queues them on a
//! bounded worker pool so a slow command never stalls the monitor tick.

use super::mute::MuteTable;
use super::runner::CommandRunner;
use super::types::Alert;
use crate::error::{ControlSignalError, DispatchError};
use crate::rules::RuleSet;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Worker threads running commands
    pub workers: usize,
    /// Jobs that may wait for a worker before new ones are dropped
    pub queue_capacity: usize,
    /// How long shutdown waits for queued and running jobs
    pub shutdown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// What happened to a dispatch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Commands were queued (count)
    Queued(usize),
    /// Symbol is muted until the given epoch
    Muted { until: i64 },
    /// The selected command is commented out
    Disabled,
    /// No enabled command is configured
    NoCommands,
}

struct Job {
    label: String,
    command_line: String,
}

/// Alert dispatcher with a bounded worker pool
pub struct AlertDispatcher {
    sender: Option<Sender<Job>>,
    done: Receiver<()>,
    workers: Vec<thread::JoinHandle<()>>,
    mutes: MuteTable,
    config: DispatcherConfig,
}

impl AlertDispatcher {
    /// Start the worker pool
    pub fn new(config: DispatcherConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let worker_count = config.workers.max(1);
        let (sender, receiver) = bounded::<Job>(config.queue_capacity.max(1));
        let (done_tx, done) = bounded::<()>(worker_count);

        let workers = (0..worker_count)
            .map(|id| {
                let receiver = receiver.clone();
                let runner = Arc::clone(&runner);
                let done_tx = done_tx.clone();
                thread::Builder::new()
                    .name(format!("tqalert-dispatch-{}", id))
                    .spawn(move || {
                        worker_loop(&receiver, runner.as_ref());
                        let _ = done_tx.send(());
                    })
            })
            .filter_map(|spawned| match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::error!("Failed to spawn dispatch worker: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Dispatcher started: {} worker(s), queue capacity {}",
            workers.len(),
            config.queue_capacity
        );

        Self {
            sender: Some(sender),
            done,
            workers,
            mutes: MuteTable::default(),
            config,
        }
    }

    /// Replace the mute table
    pub fn set_mutes(&mut self, mutes: MuteTable) {
        self.mutes = mutes;
    }

    /// Current mute table
    pub fn mutes(&self) -> &MuteTable {
        &self.mutes
    }

    /// Dispatch an alert to every enabled command, unless its symbol is muted
    pub fn dispatch(&self, rules: &RuleSet, alert: &Alert, now: i64) -> DispatchOutcome {
        if let Some(symbol) = alert.symbol.as_deref() {
            if let Some(until) = self.mutes.muted_until(symbol, now) {
                log::info!(
                    "{} is muted until {}, suppressed: {}",
                    symbol,
                    until,
                    alert.body
                );
                return DispatchOutcome::Muted { until };
            }
        }

        let mut queued = 0;
        for (idx, cmd) in rules.commands().iter().enumerate() {
            if !cmd.is_enabled() {
                log::debug!("Alert cmd#{} disabled, skipped", idx + 1);
                continue;
            }
            let label = format!("cmd#{}", idx + 1);
            match self.enqueue(label, cmd.render(&alert.header, &alert.body)) {
                Ok(()) => queued += 1,
                Err(e) => log::warn!("{}", e),
            }
        }

        if queued == 0 && rules.enabled_commands().next().is_none() {
            log::warn!("No enabled alert command configured: {}", alert.body);
            return DispatchOutcome::NoCommands;
        }
        DispatchOutcome::Queued(queued)
    }

    /// Run only the command at `index` with a canned test alert
    ///
    /// Bypasses mutes. A disabled command is a logged no-op.
    pub fn test_fire(
        &self,
        rules: &RuleSet,
        index: usize,
    ) -> Result<DispatchOutcome, ControlSignalError> {
        let cmd = rules
            .command(index)
            .ok_or(ControlSignalError::IndexOutOfRange {
                index,
                count: rules.commands().len(),
            })?;

        if !cmd.is_enabled() {
            log::info!("Test-fire of cmd#{} skipped: command is disabled", index + 1);
            return Ok(DispatchOutcome::Disabled);
        }

        let alert = Alert::test_fire(index);
        let label = format!("test cmd#{}", index + 1);
        match self.enqueue(label, cmd.render(&alert.header, &alert.body)) {
            Ok(()) => Ok(DispatchOutcome::Queued(1)),
            Err(e) => {
                log::warn!("{}", e);
                Ok(DispatchOutcome::Queued(0))
            }
        }
    }

    fn enqueue(&self, label: String, command_line: String) -> Result<(), DispatchError> {
        let sender = self.sender.as_ref().ok_or(DispatchError::Closed)?;
        log::info!("Alert {}: [{}]", label, command_line);
        match sender.try_send(Job {
            label,
            command_line,
        }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => Err(DispatchError::QueueFull(job.label)),
            Err(TrySendError::Disconnected(_)) => Err(DispatchError::Closed),
        }
    }

    /// Stop accepting jobs and wait for the pool to drain
    ///
    /// Returns `false` when the timeout expired with work still running; those
    /// workers are left detached.
    pub fn shutdown(mut self) -> bool {
        self.close()
    }

    fn close(&mut self) -> bool {
        if self.sender.take().is_none() {
            return true;
        }

        let deadline = Instant::now() + self.config.shutdown_timeout;
        let mut finished = 0;
        while finished < self.workers.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.done.recv_timeout(remaining) {
                Ok(()) => finished += 1,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Dispatcher shutdown timed out with {} worker(s) busy",
                        self.workers.len() - finished
                    );
                    self.workers.clear();
                    return false;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        log::debug!("Dispatcher drained");
        true
    }
}

impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn worker_loop(receiver: &Receiver<Job>, runner: &dyn CommandRunner) {
    for job in receiver.iter() {
        match runner.run(&job.command_line) {
            Ok(()) => log::info!("Alert {} ran via {}", job.label, runner.name()),
            Err(e) => log::warn!("Alert {} failed: {}", job.label, e),
        }
    }
}
