//! Primary/replica connection routing
//!
//! Writes always go to the primary. Batch reads may be served by a replica,
//! which for SQLite is a second, read-only connection to the same file. An
//! in-memory database has no replica; both roles resolve to the primary.

use crate::config::SqliteConfig;
use crate::connection::SqlitePool;
use crate::error::SqliteResult;
use rusqlite::Connection;
use tracing::debug;

/// Which copy of the database a statement needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    /// Authoritative copy; all writes and read-your-writes reads
    Primary,
    /// May lag the primary
    Replica,
}

/// Routes connections by role
#[derive(Clone)]
pub struct SqliteLoadBalancer {
    primary: SqlitePool,
    replica: Option<SqlitePool>,
}

impl SqliteLoadBalancer {
    /// Open the primary and, if configured, a read-only replica connection
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        let wants_replica = config.replica_reads && !config.is_memory();
        let replica_config = config.replica();
        let primary = SqlitePool::new(config)?;

        // The replica opens after the primary so the schema already exists
        let replica = if wants_replica {
            debug!("Opening read replica connection");
            Some(SqlitePool::new(replica_config)?)
        } else {
            None
        };

        Ok(Self { primary, replica })
    }

    /// Primary-only routing around an existing pool
    pub fn from_pool(primary: SqlitePool) -> Self {
        Self {
            primary,
            replica: None,
        }
    }

    pub fn memory() -> SqliteResult<Self> {
        Ok(Self::from_pool(SqlitePool::memory()?))
    }

    pub fn has_replica(&self) -> bool {
        self.replica.is_some()
    }

    pub fn pool(&self, role: ConnectionRole) -> &SqlitePool {
        match role {
            ConnectionRole::Primary => &self.primary,
            ConnectionRole::Replica => self.replica.as_ref().unwrap_or(&self.primary),
        }
    }

    pub fn with_connection<F, T>(&self, role: ConnectionRole, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        self.pool(role).with_connection(f)
    }

    pub fn with_connection_mut<F, T>(&self, role: ConnectionRole, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        self.pool(role).with_connection_mut(f)
    }
}
