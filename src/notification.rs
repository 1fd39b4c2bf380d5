//! Out-of-band advisory delivery.
//!
//! Advisories are handed to a [`NotificationDispatcher`], which forwards them
//! over a bounded channel to a worker thread owning the actual sink. The
//! frame loop never waits on delivery: a full queue drops the advisory with a
//! warning, and sink failures are logged by the worker and not retried.

use crate::{alerts::Advisory, config::AlertConfig, Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Best-effort notification channel
pub trait NotificationSink: Send {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Notification`] when delivery fails.
    fn notify(&mut self, title: &str, message: &str) -> Result<()>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Sink that only writes a log record
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, title: &str, message: &str) -> Result<()> {
        info!("ALERT: {title} - {message}");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogSink"
    }
}

/// Sink that runs a desktop notifier such as `notify-send`
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    app_name: String,
    timeout_secs: u32,
}

impl CommandSink {
    #[must_use]
    pub fn new(program: impl Into<String>, app_name: impl Into<String>, timeout_secs: u32) -> Self {
        Self {
            program: program.into(),
            app_name: app_name.into(),
            timeout_secs,
        }
    }

    /// Arguments passed to the notifier program
    #[must_use]
    pub fn args(&self, title: &str, message: &str) -> Vec<String> {
        vec![
            "--app-name".to_string(),
            self.app_name.clone(),
            "--expire-time".to_string(),
            (u64::from(self.timeout_secs) * 1000).to_string(),
            title.to_string(),
            message.to_string(),
        ]
    }
}

impl NotificationSink for CommandSink {
    fn notify(&mut self, title: &str, message: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(self.args(title, message))
            .status()
            .map_err(|e| Error::Notification(format!("Failed to run {}: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Notification(format!("{} exited with {status}", self.program)))
        }
    }

    fn name(&self) -> &str {
        "CommandSink"
    }
}

/// Create a sink by name (`log`, `notify-send`, or `command:<program>`).
///
/// # Errors
///
/// Returns [`Error::ConfigError`] for unknown sink names.
pub fn create_sink(name: &str, config: &AlertConfig) -> Result<Box<dyn NotificationSink>> {
    match name.to_lowercase().as_str() {
        "log" | "none" => Ok(Box::new(LogSink)),
        "notify-send" | "desktop" => Ok(Box::new(CommandSink::new(
            "notify-send",
            config.app_name.clone(),
            config.notification_timeout_secs,
        ))),
        _ => match name.strip_prefix("command:") {
            Some(program) if !program.is_empty() => Ok(Box::new(CommandSink::new(
                program,
                config.app_name.clone(),
                config.notification_timeout_secs,
            ))),
            _ => Err(Error::ConfigError(format!("Unknown notification sink: {name}"))),
        },
    }
}

enum DispatchCmd {
    Deliver(Advisory),
    Shutdown,
}

/// Delivery counters shared with the worker
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl DispatchStats {
    #[must_use]
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Non-blocking front end of the delivery worker
pub struct NotificationDispatcher {
    sender: Option<Sender<DispatchCmd>>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<DispatchStats>,
}

impl NotificationDispatcher {
    /// Start a worker thread that owns `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity is zero or the thread cannot be
    /// spawned.
    pub fn spawn(mut sink: Box<dyn NotificationSink>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidInput("Notification queue capacity must be greater than 0".to_string()));
        }

        let (sender, receiver) = bounded(capacity);
        let stats = Arc::new(DispatchStats::default());
        let worker_stats = Arc::clone(&stats);
        info!("Starting notification worker with {} sink", sink.name());

        let worker = thread::Builder::new()
            .name("notification-worker".to_string())
            .spawn(move || run_worker(sink.as_mut(), &receiver, &worker_stats))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            stats,
        })
    }

    /// Queue an advisory without blocking. Returns `false` if it was dropped.
    pub fn dispatch(&self, advisory: Advisory) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(DispatchCmd::Deliver(advisory)) {
            Ok(()) => true,
            Err(TrySendError::Full(DispatchCmd::Deliver(advisory))) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Notification queue full, dropping: {advisory}");
                false
            }
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Notification worker unavailable: {e}");
                false
            }
        }
    }

    /// Queue an advisory, waiting for room if the queue is full.
    /// Returns `false` only if the worker has stopped.
    pub fn dispatch_blocking(&self, advisory: Advisory) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.send(DispatchCmd::Deliver(advisory)) {
            Ok(()) => true,
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Notification worker unavailable: {e}");
                false
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> DispatchSnapshot {
        self.stats.snapshot()
    }

    /// Deliver everything already queued, then stop the worker
    pub fn shutdown(mut self) -> DispatchSnapshot {
        self.stop();
        self.stats.snapshot()
    }

    fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            // Blocking here is fine: only reached at process exit.
            if sender.send(DispatchCmd::Shutdown).is_err() {
                debug!("Notification worker already stopped");
            }
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Notification worker panicked");
            }
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(sink: &mut dyn NotificationSink, receiver: &Receiver<DispatchCmd>, stats: &DispatchStats) {
    for cmd in receiver {
        match cmd {
            DispatchCmd::Deliver(advisory) => match sink.notify(&advisory.title, &advisory.message) {
                Ok(()) => {
                    stats.delivered.fetch_add(1, Ordering::Relaxed);
                    info!("Notification sent: {}", advisory.title);
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Failed to send notification: {e}");
                    warn!("ALERT: {advisory}");
                }
            },
            DispatchCmd::Shutdown => break,
        }
    }
    debug!("Notification worker exiting");
}
