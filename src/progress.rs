//! Progress reporting to registered observers.
//!
//! A [`ProgressReporter`] fans every message out to its observers and to the
//! `tracing` log. It keeps no state besides the observer list and the
//! milestone frequency; counts are passed in by the caller and reports are
//! best-effort snapshots of them.

use std::sync::Arc;

use tracing::info;

use crate::traits::Observer;

const LOG_PREFIX: &str = "[Export]";

/// Observer that forwards messages to the `tracing` log at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, message: &str) {
        info!(target: "permscript::console", "{message}");
    }
}

#[derive(Clone)]
pub struct ProgressReporter {
    observers: Vec<Arc<dyn Observer>>,
    notify_every: usize,
}

impl ProgressReporter {
    pub fn new(notify_every: usize) -> Self {
        ProgressReporter {
            observers: Vec::new(),
            notify_every: notify_every.max(1),
        }
    }

    pub fn register(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn observers(&self) -> &[Arc<dyn Observer>] {
        &self.observers
    }

    /// Send a message verbatim to every observer.
    pub fn notify_all(&self, message: &str) {
        for observer in &self.observers {
            observer.notify(message);
        }
    }

    /// Log a stage message, prefixed, to every observer.
    pub fn log(&self, message: &str) {
        info!(event = "Export", "{message}");
        self.notify_all(&format!("{LOG_PREFIX} {message}"));
    }

    /// Report `count` unconditionally. `template` contains one `{}` placeholder.
    pub fn progress(&self, template: &str, count: usize) {
        self.log(&template.replacen("{}", &count.to_string(), 1));
    }

    /// Report `count` only when it reaches a milestone.
    ///
    /// Returns whether a report was sent.
    pub fn milestone(&self, template: &str, count: usize) -> bool {
        if count == 0 || count % self.notify_every != 0 {
            return false;
        }
        self.progress(template, count);
        true
    }
}
