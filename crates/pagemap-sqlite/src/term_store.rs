//! Companion term table
//!
//! Just enough of a term store for the term-gap anti-join: replace, delete and
//! count the terms of one entity.

use crate::load_balancer::{ConnectionRole, SqliteLoadBalancer};
use pagemap_core::{EntityId, IndexResult, Term};
use rusqlite::params;
use tracing::debug;

/// SQLite implementation of the term collaborator
#[derive(Clone)]
pub struct SqliteTermStore {
    lb: SqliteLoadBalancer,
}

impl SqliteTermStore {
    pub fn new(lb: SqliteLoadBalancer) -> Self {
        Self { lb }
    }

    /// Replace all terms of `entity_id` in one transaction
    pub fn save_terms(&self, entity_id: &EntityId, terms: &[Term]) -> IndexResult<()> {
        let entity = entity_id.as_int32()?;

        self.lb
            .with_connection_mut(ConnectionRole::Primary, |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM terms WHERE term_entity_id = ?1 AND term_entity_type = ?2",
                    params![entity.numeric_id(), entity.entity_type()],
                )?;
                {
                    let mut stmt = tx.prepare(
                        r#"
                        INSERT INTO terms (term_entity_id, term_entity_type, term_type, term_language, term_text)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        "#,
                    )?;
                    for term in terms {
                        stmt.execute(params![
                            entity.numeric_id(),
                            entity.entity_type(),
                            term.term_type.as_str(),
                            term.language,
                            term.text,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })?;

        debug!(entity_id = %entity_id, count = terms.len(), "Saved terms");
        Ok(())
    }

    pub fn delete_terms(&self, entity_id: &EntityId) -> IndexResult<usize> {
        let entity = entity_id.as_int32()?;

        let removed = self
            .lb
            .with_connection(ConnectionRole::Primary, |conn| {
                Ok(conn.execute(
                    "DELETE FROM terms WHERE term_entity_id = ?1 AND term_entity_type = ?2",
                    params![entity.numeric_id(), entity.entity_type()],
                )?)
            })?;
        Ok(removed)
    }

    pub fn term_count(&self, entity_id: &EntityId) -> IndexResult<usize> {
        let entity = entity_id.as_int32()?;

        let count: i64 = self
            .lb
            .with_connection(ConnectionRole::Primary, |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM terms WHERE term_entity_id = ?1 AND term_entity_type = ?2",
                    params![entity.numeric_id(), entity.entity_type()],
                    |row| row.get(0),
                )?)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
