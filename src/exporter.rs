//! Export driver.
//!
//! Runs the stages in a fixed order (header, groups, tracks, users) against
//! one [`RecordSink`], then flushes and decides whether the script is
//! complete. The output is always flushed and closed before a `run*` call
//! returns, whatever stage failed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::command::CommandWriter;
use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::progress::ProgressReporter;
use crate::scheduler::UserExportScheduler;
use crate::sections::SectionWriter;
use crate::sink::RecordSink;
use crate::timers::StageTimer;
use crate::traits::{Observer, Storage};
use crate::types::ExportRecord;

const HEADER: &str = "# Permission Export File";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Counters and stage timings of one export run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub groups: usize,
    pub tracks: usize,
    pub users: usize,
    /// Unique users storage reported; zero when users are not exported.
    pub expected_users: usize,
    pub failed_writes: usize,
    pub skipped_nodes: usize,
    pub groups_time: Duration,
    pub tracks_time: Duration,
    pub users_time: Duration,
}

impl ExportStats {
    pub fn total_time(&self) -> Duration {
        self.groups_time + self.tracks_time + self.users_time
    }

    fn is_complete(&self) -> bool {
        self.failed_writes == 0 && self.skipped_nodes == 0 && self.users == self.expected_users
    }

    fn incomplete(&self) -> ExportError {
        ExportError::Incomplete {
            exported: self.users,
            expected: self.expected_users,
            failed_writes: self.failed_writes,
            skipped_nodes: self.skipped_nodes,
        }
    }
}

pub struct Exporter {
    storage: Arc<dyn Storage>,
    config: ExportConfig,
    actor: String,
    commands: Arc<CommandWriter>,
    reporter: ProgressReporter,
    generated_at: Option<DateTime<FixedOffset>>,
}

impl Exporter {
    pub fn new<S: Into<String>>(storage: Arc<dyn Storage>, config: ExportConfig, actor: S) -> Self {
        let commands = Arc::new(CommandWriter::new(config.command_prefix.clone()));
        let reporter = ProgressReporter::new(config.notify_every);
        Exporter {
            storage,
            config,
            actor: actor.into(),
            commands,
            reporter,
            generated_at: None,
        }
    }

    /// Add an observer that receives every progress message of this export.
    pub fn register(&mut self, observer: Arc<dyn Observer>) {
        self.reporter.register(observer);
    }

    /// Use a fixed header timestamp instead of the local clock.
    pub fn with_timestamp(mut self, generated_at: DateTime<FixedOffset>) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export into a newly created file at `path`, replacing any existing file.
    pub fn run_to_path<P: AsRef<Path>>(&self, path: P) -> Result<ExportStats, ExportError> {
        self.config.validate()?;
        let path = path.as_ref();
        let file = File::create(path)?;
        let location = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        self.run_to_writer(BufWriter::new(file), &location.display().to_string())
    }

    /// Export into `writer`. `location` names the destination in the
    /// success notice.
    pub fn run_to_writer<W: Write + Send + 'static>(
        &self,
        writer: W,
        location: &str,
    ) -> Result<ExportStats, ExportError> {
        self.config.validate()?;

        let sink = Arc::new(RecordSink::new(writer));
        let result = self.export(&sink);
        let flushed = sink.flush();

        let (mut stats, user_failure) = result?;
        flushed?;
        stats.failed_writes = sink.failed_writes();

        if user_failure.is_some() || !stats.is_complete() {
            let err = stats.incomplete();
            if let Some(e) = user_failure {
                error!(event = "Export", phase = "Users", first_failure = %e);
            }
            if let Some(first) = sink.first_error() {
                warn!(event = "Export", phase = "Write", first_error = %first);
            }
            self.reporter.log(&format!("Export finished with errors: {err}"));
            return Err(err);
        }

        info!(
            event = "Export",
            groups = stats.groups,
            tracks = stats.tracks,
            users = stats.users,
            elapsed_ms = stats.total_time().as_millis() as u64
        );
        self.reporter
            .notify_all(&format!("Successfully exported to {location}"));
        Ok(stats)
    }

    /// Best-effort export to `path`: failures are logged and reported to
    /// observers, never returned.
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Option<ExportStats> {
        match self.run_to_path(path) {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!(event = "Export", error = %e);
                self.reporter.log(&format!("Export failed: {e}"));
                None
            }
        }
    }

    fn header(&self) -> ExportRecord {
        let generated_at = self
            .generated_at
            .unwrap_or_else(|| Local::now().fixed_offset());
        let mut record = ExportRecord::new();
        record.push(HEADER);
        record.push(format!(
            "# Generated by {} at {}",
            self.actor.replace(['\n', '\r'], " "),
            generated_at.format(TIMESTAMP_FORMAT)
        ));
        record.blank();
        record
    }

    fn export(
        &self,
        sink: &Arc<RecordSink>,
    ) -> Result<(ExportStats, Option<ExportError>), ExportError> {
        let mut stats = ExportStats::default();
        let default_group = self.config.default_group.as_str();
        let sections = SectionWriter::new(sink, &self.commands, &self.reporter, default_group);

        self.reporter.log("Starting.");
        sink.emit(&self.header());

        {
            let _timer = StageTimer::start("Groups", &mut stats.groups_time);
            self.reporter.log("Starting group export.");
            let section = sections.write_groups(self.storage.groups()?);
            stats.groups = section.written;
            stats.skipped_nodes += section.skipped_nodes;
            self.reporter
                .log(&format!("Exported {} groups.", section.written));
        }

        {
            let _timer = StageTimer::start("Tracks", &mut stats.tracks_time);
            self.reporter.log("Starting track export.");
            let tracks = self.storage.tracks()?;
            let section = sections.write_tracks(&tracks);
            stats.tracks = section.written;
            stats.skipped_nodes += section.skipped_nodes;
            self.reporter
                .log(&format!("Exported {} tracks.", section.written));
        }

        if !self.config.include_users {
            return Ok((stats, None));
        }

        let timer = StageTimer::start("Users", &mut stats.users_time);
        let outcome = UserExportScheduler::new(
            Arc::clone(&self.storage),
            Arc::clone(sink),
            Arc::clone(&self.commands),
            &self.reporter,
            default_group,
        )
        .with_workers(self.config.workers)
        .with_poll_interval(self.config.poll_interval())
        .run()?;
        drop(timer);

        stats.users = outcome.exported;
        stats.expected_users = outcome.expected;
        stats.skipped_nodes += outcome.skipped_nodes;
        Ok((stats, outcome.failure))
    }
}

#[cfg(test)]
mod tests;
