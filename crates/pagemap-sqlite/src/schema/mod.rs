//! Schema management and migrations

use crate::error::{SqliteError, SqliteResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

/// Get current schema version
fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: entity-per-page index and companion term table
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: entity_per_page + terms");

    conn.execute_batch(SCHEMA_V1).map_err(|e| {
        SqliteError::Schema(format!("Failed to apply v1 schema: {}", e))
    })?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

/// Initial schema SQL
///
/// The unique indexes here must match `UNIQUE_KEYS` in the writer.
const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: entity_per_page
-- ============================================================================
-- One row per entity; redirects carry the serialized target id.
-- No CHECK on page id: INSERT OR IGNORE would swallow it as a conflict.

CREATE TABLE IF NOT EXISTS entity_per_page (
    epp_entity_id INTEGER NOT NULL,
    epp_entity_type TEXT NOT NULL,
    epp_page_id INTEGER NOT NULL,
    epp_redirect_target TEXT
);

-- id before type: listing sorts and pages in this order
CREATE UNIQUE INDEX IF NOT EXISTS epp_entity ON entity_per_page(epp_entity_id, epp_entity_type);
CREATE UNIQUE INDEX IF NOT EXISTS epp_page ON entity_per_page(epp_page_id);
CREATE INDEX IF NOT EXISTS epp_redirect_target ON entity_per_page(epp_redirect_target);

-- ============================================================================
-- TABLE: terms
-- ============================================================================
-- Language-tagged labels, descriptions and aliases, keyed like the index

CREATE TABLE IF NOT EXISTS terms (
    term_row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    term_entity_id INTEGER NOT NULL,
    term_entity_type TEXT NOT NULL,
    term_type TEXT NOT NULL CHECK (term_type IN ('label', 'description', 'alias')),
    term_language TEXT NOT NULL,
    term_text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS term_entity ON terms(term_entity_id, term_entity_type, term_type, term_language);
"#;
