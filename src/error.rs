use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("failed to access output: {0}")]
    Io(String),

    #[error("failed to write record: {0}")]
    Write(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("user {0} not found in storage")]
    UserNotFound(Uuid),

    #[error("worker error: {0}")]
    Worker(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error(
        "export incomplete: {exported} of {expected} users exported, {failed_writes} records failed to write, {skipped_nodes} nodes skipped"
    )]
    Incomplete {
        exported: usize,
        expected: usize,
        failed_writes: usize,
        skipped_nodes: usize,
    },
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Snapshot(err.to_string())
    }
}
