//! Concurrent user export.
//!
//! Each user is exported by one task on a bounded rayon pool: load, build
//! the record in isolation, release the storage cache entry, emit through
//! the shared [`RecordSink`], count. Records arrive in completion order.
//!
//! The driving thread waits on a result channel and a ticker at the same
//! time, so the operator gets a progress line every poll interval however
//! long individual storage reads take. The first failing task stops any
//! task that has not started yet; tasks already running finish normally.
//! The pool is drained before the stage returns, so no worker touches the
//! output afterwards.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{select, tick, unbounded};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::command::CommandWriter;
use crate::error::ExportError;
use crate::progress::ProgressReporter;
use crate::sections::push_node_commands;
use crate::sink::RecordSink;
use crate::traits::Storage;
use crate::types::{ExportRecord, HolderType, Node, User};

const UNKNOWN_USERNAME: &str = "unknown username";

/// Build the record for one user.
///
/// Membership of the default group is not written as a command; a user
/// replayed on a fresh instance starts in the default group, so instead an
/// explicit removal is written when the stored user does *not* hold it.
/// Returns the record and the number of nodes that had to be skipped.
pub fn user_record(
    user: &User,
    commands: &CommandWriter,
    default_group: &str,
) -> (ExportRecord, usize) {
    let uuid = user.uuid();
    let id = uuid.to_string();
    let mut record = ExportRecord::new();

    let name = user.name().unwrap_or(UNKNOWN_USERNAME).replace(['\n', '\r'], " ");
    record.push(format!("# Export user: {id} - {name}"));

    let (default_memberships, nodes): (Vec<&Node>, Vec<&Node>) = user
        .nodes()
        .iter()
        .partition(|node| node.is_membership_of(default_group));
    let in_default = !default_memberships.is_empty();

    let mut skipped = push_node_commands(&mut record, commands, nodes, HolderType::User, &id);

    let primary = user.primary_group_or(default_group);
    if !primary.eq_ignore_ascii_case(default_group) {
        match commands.switch_primary_group(uuid, primary) {
            Ok(line) => record.push(line),
            Err(e) => {
                error!(event = "Export", phase = "Users", user = %uuid, error = %e);
                skipped += 1;
            }
        }
    }

    if !in_default {
        match commands.remove_parent(uuid, default_group) {
            Ok(line) => record.push(line),
            Err(e) => {
                error!(event = "Export", phase = "Users", user = %uuid, error = %e);
                skipped += 1;
            }
        }
    }

    (record, skipped)
}

/// Result of the user stage.
#[derive(Debug, Default)]
pub struct UserStageOutcome {
    /// Number of unique users storage reported.
    pub expected: usize,
    /// Number of user records handed to the sink.
    pub exported: usize,
    pub skipped_nodes: usize,
    /// First task failure, if any. Later failures are only logged.
    pub failure: Option<ExportError>,
}

impl UserStageOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.exported == self.expected
    }
}

enum TaskOutcome {
    Done,
    Skipped,
    Failed(ExportError),
}

/// Shared state handed to every user task.
struct TaskContext {
    storage: Arc<dyn Storage>,
    sink: Arc<RecordSink>,
    commands: Arc<CommandWriter>,
    default_group: Arc<str>,
    exported: AtomicUsize,
    skipped_nodes: AtomicUsize,
    stop: AtomicBool,
}

impl TaskContext {
    fn export_user(&self, uuid: Uuid) -> Result<(), ExportError> {
        let user = self.storage.load_user(uuid)?;
        let (record, skipped) = user_record(&user, &self.commands, &self.default_group);
        self.storage.release_user(&user);
        self.sink.emit(&record);
        self.exported.fetch_add(1, Ordering::Relaxed);
        if skipped > 0 {
            self.skipped_nodes.fetch_add(skipped, Ordering::Relaxed);
        }
        debug!(event = "Export", phase = "Users", user = %uuid, lines = record.len());
        Ok(())
    }

    fn run(&self, uuid: Uuid) -> TaskOutcome {
        if self.stop.load(Ordering::Acquire) {
            return TaskOutcome::Skipped;
        }
        match catch_unwind(AssertUnwindSafe(|| self.export_user(uuid))) {
            Ok(Ok(())) => TaskOutcome::Done,
            Ok(Err(e)) => TaskOutcome::Failed(e),
            Err(payload) => TaskOutcome::Failed(ExportError::Worker(format!(
                "task for user {uuid} panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct UserExportScheduler<'a> {
    storage: Arc<dyn Storage>,
    sink: Arc<RecordSink>,
    commands: Arc<CommandWriter>,
    reporter: &'a ProgressReporter,
    default_group: Arc<str>,
    workers: usize,
    poll_interval: Duration,
}

impl<'a> UserExportScheduler<'a> {
    pub fn new(
        storage: Arc<dyn Storage>,
        sink: Arc<RecordSink>,
        commands: Arc<CommandWriter>,
        reporter: &'a ProgressReporter,
        default_group: &str,
    ) -> Self {
        UserExportScheduler {
            storage,
            sink,
            commands,
            reporter,
            default_group: Arc::from(default_group),
            workers: 32,
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Export every unique user and wait for all tasks to finish.
    ///
    /// Errors are returned only when the stage cannot start (enumeration or
    /// pool construction failed); task failures are reported in the outcome.
    pub fn run(&self) -> Result<UserStageOutcome, ExportError> {
        self.reporter
            .log("Starting user export. Finding a list of unique users to export.");

        let users = self.storage.unique_users()?;
        let expected = users.len();
        self.reporter
            .log(&format!("Found {expected} unique users to export."));

        self.sink.emit(&["# Export users"].into_iter().collect());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("user-export-{i}"))
            .build()
            .map_err(|e| ExportError::Worker(e.to_string()))?;

        let context = Arc::new(TaskContext {
            storage: Arc::clone(&self.storage),
            sink: Arc::clone(&self.sink),
            commands: Arc::clone(&self.commands),
            default_group: Arc::clone(&self.default_group),
            exported: AtomicUsize::new(0),
            skipped_nodes: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });

        let (results_tx, results_rx) = unbounded::<(Uuid, TaskOutcome)>();
        for uuid in users {
            let context = Arc::clone(&context);
            let results_tx = results_tx.clone();
            pool.spawn(move || {
                let outcome = context.run(uuid);
                // Release the sink before reporting, so the output is closed
                // once the last result has been received.
                drop(context);
                let _ = results_tx.send((uuid, outcome));
            });
        }
        drop(results_tx);

        info!(
            event = "Export",
            phase = "Users",
            dispatched = expected,
            workers = self.workers
        );

        let ticker = tick(self.poll_interval);
        let mut finished = 0usize;
        let mut failure: Option<ExportError> = None;

        while finished < expected {
            select! {
                recv(results_rx) -> message => match message {
                    Ok((uuid, TaskOutcome::Failed(e))) => {
                        finished += 1;
                        error!(event = "Export", phase = "Users", user = %uuid, error = %e);
                        if failure.is_none() {
                            context.stop.store(true, Ordering::Release);
                            self.reporter.log(&format!(
                                "Failed to export user {uuid}: {e}. Remaining users are skipped."
                            ));
                            failure = Some(e);
                        }
                    }
                    Ok((_, TaskOutcome::Done | TaskOutcome::Skipped)) => finished += 1,
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    self.reporter.progress(
                        "Exported {} users so far.",
                        context.exported.load(Ordering::Relaxed),
                    );
                }
            }
        }

        drop(pool);

        let exported = context.exported.load(Ordering::Relaxed);
        self.reporter.log(&format!("Exported {exported} users."));

        Ok(UserStageOutcome {
            expected,
            exported,
            skipped_nodes: context.skipped_nodes.load(Ordering::Relaxed),
            failure,
        })
    }
}
