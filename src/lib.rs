//! todods - a hierarchical to-do list kept in a single JSON file.
//!
//! This library provides the core functionality for the `todo` CLI tool:
//! the task tree store, its persistence, configuration, and the command
//! implementations the CLI dispatches to.

pub mod cli;
pub mod commands;
pub mod config;
pub mod due;
pub mod models;
pub mod storage;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::{Path, PathBuf};

    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::storage::{ManualClock, TodoStore};

    /// Test environment with an isolated data directory and a manual clock.
    pub struct TestEnv {
        /// Isolated data storage directory
        pub data_dir: TempDir,
        /// Clock shared with every store opened from this environment
        pub clock: ManualClock,
    }

    impl TestEnv {
        /// Create a new test environment whose clock starts at 2024-05-01 08:00 UTC.
        pub fn new() -> Self {
            Self {
                data_dir: TempDir::new().unwrap(),
                clock: ManualClock::new(Self::epoch()),
            }
        }

        /// The instant the manual clock starts at.
        pub fn epoch() -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        }

        /// Path to the isolated data directory.
        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Path of the to-do file inside the data directory.
        pub fn data_file(&self) -> PathBuf {
            self.data_path().join("todos.json")
        }

        /// Open and load a store backed by this environment's data file.
        pub fn open_store(&self) -> TodoStore {
            let mut store = TodoStore::with_clock(self.data_file(), Box::new(self.clock.clone()));
            store.load();
            store
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for todods operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Item is not a list: {0}")]
    NotAList(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

/// Result type alias for todods operations.
pub type Result<T> = std::result::Result<T, Error>;
