//! Column set and unique keys of `entity_per_page`
//!
//! The writer derives its conflict-removal predicate from [`UNIQUE_KEYS`], so
//! this table must list exactly the unique indexes created by the schema.

use pagemap_core::EntityPageRow;
use rusqlite::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    EntityId,
    EntityType,
    PageId,
    RedirectTarget,
}

impl Column {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Column::EntityId => "epp_entity_id",
            Column::EntityType => "epp_entity_type",
            Column::PageId => "epp_page_id",
            Column::RedirectTarget => "epp_redirect_target",
        }
    }

    /// SQL value of this column for `row`
    pub(crate) fn value(self, row: &EntityPageRow) -> Value {
        match self {
            Column::EntityId => Value::Integer(row.entity.numeric_id().into()),
            Column::EntityType => Value::Text(row.entity.entity_type().to_string()),
            Column::PageId => Value::Integer(row.page_id),
            Column::RedirectTarget => row
                .redirect_target
                .clone()
                .map_or(Value::Null, Value::Text),
        }
    }
}

/// Insert order of the columns
pub(crate) const ALL_COLUMNS: [Column; 4] = [
    Column::EntityId,
    Column::EntityType,
    Column::PageId,
    Column::RedirectTarget,
];

/// A unique index, by name and covered columns
#[derive(Debug)]
pub(crate) struct UniqueKey {
    pub(crate) name: &'static str,
    pub(crate) columns: &'static [Column],
}

pub(crate) const UNIQUE_KEYS: &[UniqueKey] = &[
    UniqueKey {
        name: "epp_entity",
        columns: &[Column::EntityId, Column::EntityType],
    },
    UniqueKey {
        name: "epp_page",
        columns: &[Column::PageId],
    },
];

/// A WHERE fragment with its positional parameters
#[derive(Debug, PartialEq)]
pub(crate) struct Conditions {
    pub(crate) sql: String,
    pub(crate) values: Vec<Value>,
}

/// Every row that could block inserting `row`: one AND-group per unique key,
/// OR-ed together
pub(crate) fn conflict_conditions(row: &EntityPageRow) -> Conditions {
    let mut values = Vec::new();
    let groups: Vec<String> = UNIQUE_KEYS
        .iter()
        .map(|key| {
            let parts: Vec<String> = key
                .columns
                .iter()
                .map(|column| {
                    values.push(column.value(row));
                    format!("{} = ?", column.name())
                })
                .collect();
            format!("({})", parts.join(" AND "))
        })
        .collect();

    Conditions {
        sql: groups.join(" OR "),
        values,
    }
}

/// Values in [`ALL_COLUMNS`] order
pub(crate) fn row_values(row: &EntityPageRow) -> Vec<Value> {
    ALL_COLUMNS.iter().map(|column| column.value(row)).collect()
}
