//! Serialized output sink.
//!
//! All output of an export goes through one [`RecordSink`]. The sink holds
//! the writer behind a single lock that is taken once per record, so the
//! lines of a record are never interleaved with another record's lines,
//! whichever worker thread emits it.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::ExportError;
use crate::types::ExportRecord;

pub struct RecordSink {
    writer: Mutex<Box<dyn Write + Send>>,
    records: AtomicUsize,
    failed: AtomicUsize,
    first_error: Mutex<Option<String>>,
}

impl RecordSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        RecordSink {
            writer: Mutex::new(Box::new(writer)),
            records: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            first_error: Mutex::new(None),
        }
    }

    /// Append every line of `record` as one uninterrupted block.
    ///
    /// A write failure is logged and counted but not returned: the export
    /// keeps going and the driver inspects [`failed_writes`](Self::failed_writes)
    /// when the job ends.
    pub fn emit(&self, record: &ExportRecord) {
        let result = {
            let mut writer = self.writer.lock();
            write_lines(&mut **writer, record)
        };

        match result {
            Ok(()) => {
                self.records.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(event = "Export", phase = "Write", lines = record.len(), error = %e);
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.first_error.lock().get_or_insert_with(|| e.to_string());
            }
        }
    }

    pub fn flush(&self) -> Result<(), ExportError> {
        self.writer.lock().flush()?;
        Ok(())
    }

    /// Number of records written in full.
    pub fn records_written(&self) -> usize {
        self.records.load(Ordering::Relaxed)
    }

    pub fn failed_writes(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Message of the first failed write, if any.
    pub fn first_error(&self) -> Option<String> {
        self.first_error.lock().clone()
    }
}

fn write_lines(writer: &mut dyn Write, record: &ExportRecord) -> Result<(), ExportError> {
    for line in record.lines() {
        writeln!(writer, "{line}").map_err(|e| ExportError::Write(e.to_string()))?;
    }
    Ok(())
}
