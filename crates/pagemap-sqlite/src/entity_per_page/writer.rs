//! Insert-or-replace for `entity_per_page`
//!
//! SQLite has no "replace on any unique-key conflict without touching other
//! rows" statement that also reports what it replaced, so a write is:
//!
//! 1. existence probe for the exact row (no-op if present)
//! 2. `INSERT OR IGNORE`, which drops the row on a conflict with either key
//! 3. on a conflict, delete the rows matching either unique key of the new
//!    row, then insert again without IGNORE
//!
//! Step 3 only touches rows reachable by point lookups on the two unique
//! indexes. If another writer recreates a conflicting row between the delete
//! and the second insert, the insert fails and the write is reported as a
//! consistency violation instead of being retried.

use super::unique_keys::{conflict_conditions, row_values};
use crate::error::{is_constraint_violation, SqliteError, SqliteResult};
use pagemap_core::{EntityPageRow, Int32EntityId, PutOutcome};
use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, error};

const INSERT_IGNORE: &str = "INSERT OR IGNORE INTO entity_per_page \
    (epp_entity_id, epp_entity_type, epp_page_id, epp_redirect_target) VALUES (?1, ?2, ?3, ?4)";

const INSERT: &str = "INSERT INTO entity_per_page \
    (epp_entity_id, epp_entity_type, epp_page_id, epp_redirect_target) VALUES (?1, ?2, ?3, ?4)";

pub(crate) fn put_row(conn: &Connection, row: &EntityPageRow) -> SqliteResult<PutOutcome> {
    if row_exists(conn, row)? {
        debug!(
            entity_id = row.entity.numeric_id(),
            entity_type = row.entity.entity_type(),
            page_id = row.page_id,
            "Row already present"
        );
        return Ok(PutOutcome::Unchanged);
    }

    let values = row_values(row);

    if conn.execute(INSERT_IGNORE, params_from_iter(values.iter()))? > 0 {
        return Ok(PutOutcome::Inserted);
    }

    let conditions = conflict_conditions(row);
    let removed = conn.execute(
        &format!("DELETE FROM entity_per_page WHERE {}", conditions.sql),
        params_from_iter(conditions.values.iter()),
    )?;
    debug!(
        entity_id = row.entity.numeric_id(),
        entity_type = row.entity.entity_type(),
        page_id = row.page_id,
        removed,
        "Removed conflicting rows"
    );

    match conn.execute(INSERT, params_from_iter(values.iter())) {
        Ok(_) => Ok(PutOutcome::Replaced { removed }),
        Err(e) if is_constraint_violation(&e) => {
            error!(
                entity_id = row.entity.numeric_id(),
                entity_type = row.entity.entity_type(),
                page_id = row.page_id,
                "Conflicting row reappeared after conflict removal"
            );
            Err(SqliteError::ConsistencyViolation(format!(
                "row for {} {} on page {} conflicted again after removing {} row(s): {}",
                row.entity.entity_type(),
                row.entity.numeric_id(),
                row.page_id,
                removed,
                e
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Exact match on all four columns; `IS` so a NULL target matches NULL
fn row_exists(conn: &Connection, row: &EntityPageRow) -> SqliteResult<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM entity_per_page \
         WHERE epp_entity_id = ?1 AND epp_entity_type = ?2 \
         AND epp_page_id = ?3 AND epp_redirect_target IS ?4)",
        params_from_iter(row_values(row).iter()),
        |r| r.get(0),
    )?;

    Ok(exists)
}

pub(crate) fn delete_row(conn: &Connection, entity: &Int32EntityId) -> SqliteResult<usize> {
    let removed = conn.execute(
        "DELETE FROM entity_per_page WHERE epp_entity_id = ?1 AND epp_entity_type = ?2",
        params![entity.numeric_id(), entity.entity_type()],
    )?;

    Ok(removed)
}

pub(crate) fn clear(conn: &Connection) -> SqliteResult<usize> {
    Ok(conn.execute("DELETE FROM entity_per_page", [])?)
}
