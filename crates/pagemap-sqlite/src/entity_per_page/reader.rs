//! Keyset listing over `entity_per_page`

use crate::error::SqliteResult;
use pagemap_core::{Int32EntityId, RedirectFilter};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Listing parameters after validation
pub(crate) struct ListingQuery<'a> {
    pub(crate) entity_type: Option<&'a str>,
    pub(crate) limit: usize,
    pub(crate) after: Option<&'a Int32EntityId>,
    pub(crate) redirects: RedirectFilter,
}

impl ListingQuery<'_> {
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values = Vec::new();

        // Must follow the epp_entity index: id first, then type
        let order_by = match self.entity_type {
            None => "epp_entity_id, epp_entity_type",
            Some(entity_type) => {
                conditions.push("epp_entity_type = ?");
                values.push(Value::Text(entity_type.to_string()));
                "epp_entity_id"
            }
        };

        match self.redirects {
            RedirectFilter::ExcludeRedirects => conditions.push("epp_redirect_target IS NULL"),
            RedirectFilter::OnlyRedirects => conditions.push("epp_redirect_target IS NOT NULL"),
            RedirectFilter::All => {}
        }

        if let Some(after) = self.after {
            let numeric_id = Value::Integer(after.numeric_id().into());
            match self.entity_type {
                None => {
                    conditions.push(
                        "((epp_entity_type > ? AND epp_entity_id = ?) OR epp_entity_id > ?)",
                    );
                    values.push(Value::Text(after.entity_type().to_string()));
                    values.push(numeric_id.clone());
                    values.push(numeric_id);
                }
                Some(_) => {
                    conditions.push("epp_entity_id > ?");
                    values.push(numeric_id);
                }
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        values.push(Value::Integer(i64::try_from(self.limit).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT epp_entity_type, epp_entity_id FROM entity_per_page{where_clause} \
             ORDER BY {order_by} LIMIT ?"
        );

        (sql, values)
    }
}

/// Raw `(type tag, numeric id)` pairs in index order
pub(crate) fn list_rows(conn: &Connection, query: &ListingQuery) -> SqliteResult<Vec<(String, i64)>> {
    let (sql, values) = query.to_sql();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
