//! Anti-join between the index and the term table
//!
//! An entity lacks a term when the LEFT JOIN on (id, type, term type,
//! language) finds nothing. Redirect rows are filtered on the index side so
//! they never show up as gaps.

use crate::error::SqliteResult;
use pagemap_core::TermGapQuery;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

fn to_sql(query: &TermGapQuery) -> (String, Vec<Value>) {
    let mut join = vec![
        "term_entity_id = epp_entity_id",
        "term_entity_type = epp_entity_type",
        "term_type = ?",
    ];
    let mut values = vec![Value::Text(query.term_type.as_str().to_string())];

    if let Some(language) = &query.language {
        join.push("term_language = ?");
        values.push(Value::Text(language.clone()));
    }

    let mut conditions = vec!["term_entity_type IS NULL", "epp_redirect_target IS NULL"];
    if let Some(entity_type) = &query.entity_type {
        conditions.push("epp_entity_type = ?");
        values.push(Value::Text(entity_type.clone()));
    }

    values.push(Value::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));
    values.push(Value::Integer(i64::try_from(query.offset).unwrap_or(i64::MAX)));

    let sql = format!(
        "SELECT epp_entity_type, epp_entity_id FROM entity_per_page \
         LEFT JOIN terms ON {} \
         WHERE {} \
         ORDER BY epp_page_id DESC LIMIT ? OFFSET ?",
        join.join(" AND "),
        conditions.join(" AND ")
    );

    (sql, values)
}

/// Raw `(type tag, numeric id)` pairs, highest page id first
pub(crate) fn rows_without_term(
    conn: &Connection,
    query: &TermGapQuery,
) -> SqliteResult<Vec<(String, i64)>> {
    let (sql, values) = to_sql(query);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
