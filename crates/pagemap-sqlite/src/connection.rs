//! SQLite connection pool management
//!
//! Uses a simple Arc<Mutex<Connection>> pattern instead of r2d2 to avoid
//! version conflicts with other workspace crates.

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe SQLite connection wrapper
///
/// For SQLite in WAL mode, we can have multiple readers but only one writer.
/// This simple wrapper uses a mutex for thread safety.
#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqlitePool {
    /// Create a new connection pool with the given configuration
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, read_only = config.read_only, "Creating SQLite connection");

        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else if config.read_only {
            Connection::open_with_flags(
                &config.path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            // Ensure parent directory exists
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SqliteError::Connection(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(&config.path)?
        };

        let sqlite_pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };

        // Configure and apply schema
        sqlite_pool.initialize()?;

        Ok(sqlite_pool)
    }

    /// Create an in-memory pool for testing
    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Execute a closure with the connection
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access to the connection
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    /// Initialize the database (configure pragmas and apply schema)
    fn initialize(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            // Apply PRAGMA settings
            self.configure_pragmas(conn)?;

            // A read-only handle relies on the primary having migrated
            if !self.config.read_only {
                schema::apply_migrations(conn)?;
            }

            info!("SQLite database initialized successfully");
            Ok(())
        })
    }

    /// Configure SQLite PRAGMA settings for optimal performance
    fn configure_pragmas(&self, conn: &Connection) -> SqliteResult<()> {
        debug!("Configuring SQLite pragmas");

        // journal_mode is a property of the file; only the writer sets it
        if self.config.wal_mode && !self.config.read_only {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }

        // Foreign key enforcement
        if self.config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        // Busy timeout
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))?;

        // Cache size
        conn.execute_batch(&format!("PRAGMA cache_size = {};", self.config.cache_size))?;

        // MMAP for faster reads (if configured)
        if self.config.mmap_size > 0 {
            conn.execute_batch(&format!("PRAGMA mmap_size = {};", self.config.mmap_size))?;
        }

        // Use memory for temp tables
        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;

        Ok(())
    }
}
