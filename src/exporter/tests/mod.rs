use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use super::*;
use crate::memory::MemoryStorage;
use crate::types::{Group, Node, Track, User};

mod script;

const ALICE: &str = "c5b7a2c4-3f1e-4d55-9a4e-0b1f8a6d2e10";

/// In-memory writer whose contents stay readable after the sink took it.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl Collect {
    fn messages(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn contains(&self, needle: &str) -> bool {
        self.0.lock().iter().any(|m| m.contains(needle))
    }
}

impl Observer for Collect {
    fn notify(&self, message: &str) {
        self.0.lock().push(message.to_string());
    }
}

fn fixed_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-10-16T12:00:00+00:00").unwrap()
}

fn test_config() -> ExportConfig {
    ExportConfig::default()
        .with_workers(4)
        .with_poll_interval(Duration::from_millis(20))
}

fn exporter(storage: &Arc<MemoryStorage>, config: ExportConfig) -> (Exporter, Arc<Collect>) {
    let observer = Arc::new(Collect::default());
    let mut exporter = Exporter::new(storage.clone(), config, "console").with_timestamp(fixed_time());
    exporter.register(observer.clone());
    (exporter, observer)
}

fn export_to_string(exporter: &Exporter) -> (Result<ExportStats, ExportError>, String) {
    let buffer = SharedBuffer::default();
    let result = exporter.run_to_writer(buffer.clone(), "memory");
    (result, buffer.contents())
}

/// The three groups of a small staff hierarchy: admin (10), mod (5) and
/// the default group.
fn staff_storage() -> Arc<MemoryStorage> {
    let storage = MemoryStorage::new();
    storage.insert_group(
        Group::new("default").with_node(Node::new("essentials.spawn")),
    );
    storage.insert_group(
        Group::new("mod")
            .with_weight(5)
            .with_node(Node::new("essentials.kick")),
    );
    storage.insert_group(
        Group::new("admin")
            .with_weight(10)
            .with_node(Node::inheritance("mod"))
            .with_node(Node::new("essentials.*")),
    );
    Arc::new(storage)
}

fn insert_users(storage: &MemoryStorage, count: usize) -> Vec<Uuid> {
    (0..count)
        .map(|i| {
            let uuid = Uuid::new_v4();
            storage.insert_user(
                User::new(uuid)
                    .with_name(format!("user{i}"))
                    .with_node(Node::inheritance("mod"))
                    .with_node(Node::new(format!("plots.plot.{i}")))
                    .with_node(Node::new("essentials.home").with_context("server", "survival")),
            );
            uuid
        })
        .collect()
}

/// Split the user section into records, one per `# Export user:` comment.
fn user_records(script: &str) -> Vec<Vec<&str>> {
    let mut records: Vec<Vec<&str>> = Vec::new();
    let section = script
        .split_once("# Export users\n")
        .map(|(_, users)| users)
        .unwrap_or_default();
    for line in section.lines() {
        if line.starts_with("# Export user: ") {
            records.push(vec![line]);
        } else if let Some(record) = records.last_mut() {
            record.push(line);
        } else {
            panic!("line outside of a user record: {line}");
        }
    }
    records
}
