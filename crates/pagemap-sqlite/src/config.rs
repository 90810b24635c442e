//! SQLite connection configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MEMORY_PATH: &str = ":memory:";

/// Configuration for a SQLite-backed index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,

    /// Enable write-ahead logging
    pub wal_mode: bool,

    pub foreign_keys: bool,

    /// How long a writer waits on a locked database
    pub busy_timeout_ms: u32,

    /// Page cache size (negative values are KiB, see SQLite docs)
    pub cache_size: i64,

    /// Memory-mapped I/O size in bytes (0 disables)
    pub mmap_size: u64,

    /// Open without write access; migrations are skipped
    pub read_only: bool,

    /// Serve listing and term-gap reads from a separate read-only connection
    pub replica_reads: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./pagemap.db"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            cache_size: -16000,
            mmap_size: 0,
            read_only: false,
            replica_reads: false,
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// In-memory database (tests, scratch indexes)
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            wal_mode: false,
            ..Self::default()
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(MEMORY_PATH)
    }

    pub fn with_wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }

    pub fn with_cache_size(mut self, cache_size: i64) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn with_mmap_size(mut self, mmap_size: u64) -> Self {
        self.mmap_size = mmap_size;
        self
    }

    pub fn with_replica_reads(mut self, enabled: bool) -> Self {
        self.replica_reads = enabled;
        self
    }

    /// Read-only configuration for the same database file
    pub fn replica(&self) -> Self {
        Self {
            read_only: true,
            replica_reads: false,
            ..self.clone()
        }
    }
}
