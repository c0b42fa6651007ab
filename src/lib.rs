// src/lib.rs
pub use command::{CommandWriter, quote_arg};
pub use config::ExportConfig;
pub use error::ExportError;
pub use exporter::{ExportStats, Exporter};
pub use loader::load_snapshot;
pub use memory::MemoryStorage;
pub use progress::{LogObserver, ProgressReporter};
pub use scheduler::{UserExportScheduler, UserStageOutcome, user_record};
pub use sections::{SectionStats, SectionWriter, group_order, sort_groups};
pub use sink::RecordSink;
pub use traits::{Observer, Storage};
pub use types::{ExportRecord, Group, HolderType, Node, NodeKind, Track, User};

mod command;
mod config;
mod error;
mod exporter;
mod loader;
mod memory;
mod progress;
mod scheduler;
mod sections;
mod sink;
mod timers;
mod traits;
mod types;
