//! EntityPerPage implementation for SQLite
//!
//! Writes go to the primary connection. Listing and term-gap scans go to the
//! replica when one is configured, unless the table was built with
//! [`SqliteEntityPerPage::reads_from_primary`].

mod reader;
mod term_gaps;
mod unique_keys;
mod writer;

use crate::config::SqliteConfig;
use crate::error::SqliteResult;
use crate::load_balancer::{ConnectionRole, SqliteLoadBalancer};
use async_trait::async_trait;
use pagemap_core::index::validate_listing;
use pagemap_core::{
    AsyncEntityPerPage, EntitiesWithoutTermFinder, EntityId, EntityIdComposer, EntityPageRow,
    EntityPerPage, IndexError, IndexResult, Int32EntityId, PrefixedIdCodec, PutOutcome,
    RedirectFilter, TermGapQuery,
};
use reader::ListingQuery;
use std::sync::Arc;
use tracing::warn;

/// SQLite implementation of EntityPerPage
#[derive(Clone)]
pub struct SqliteEntityPerPage {
    lb: SqliteLoadBalancer,
    composer: Arc<dyn EntityIdComposer>,
    read_role: ConnectionRole,
}

impl SqliteEntityPerPage {
    /// Create a table over the given connections with the default codec
    pub fn new(lb: SqliteLoadBalancer) -> Self {
        Self {
            lb,
            composer: Arc::new(PrefixedIdCodec::default()),
            read_role: ConnectionRole::Replica,
        }
    }

    /// Open (and migrate) the database described by `config`
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self::new(SqliteLoadBalancer::new(config)?))
    }

    pub fn with_composer(mut self, composer: Arc<dyn EntityIdComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// Route listing and term-gap reads to the primary (read-your-writes)
    pub fn reads_from_primary(mut self) -> Self {
        self.read_role = ConnectionRole::Primary;
        self
    }

    pub fn load_balancer(&self) -> &SqliteLoadBalancer {
        &self.lb
    }

    /// Single-entity operations only accept types the codec can compose
    fn ensure_supported(&self, entity: &Int32EntityId) -> IndexResult<()> {
        self.composer
            .compose(entity.entity_type(), entity.numeric_id().into())?;
        Ok(())
    }

    /// Compose ids, skipping rows whose type tag is unknown
    fn compose_ids(&self, rows: Vec<(String, i64)>) -> Vec<EntityId> {
        rows.into_iter()
            .filter_map(
                |(entity_type, numeric_id)| match self.composer.compose(&entity_type, numeric_id) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        warn!(
                            entity_type = %entity_type,
                            numeric_id,
                            error = %err,
                            "Unsupported entity type in index row, skipping"
                        );
                        None
                    }
                },
            )
            .collect()
    }
}

impl EntityPerPage for SqliteEntityPerPage {
    fn put(
        &self,
        entity_id: &EntityId,
        page_id: i64,
        redirect_target: Option<&EntityId>,
    ) -> IndexResult<PutOutcome> {
        let row = EntityPageRow::new(entity_id, page_id, redirect_target)?;
        self.ensure_supported(&row.entity)?;

        let outcome = self
            .lb
            .with_connection(ConnectionRole::Primary, |conn| writer::put_row(conn, &row))?;
        Ok(outcome)
    }

    fn delete_entity(&self, entity_id: &EntityId) -> IndexResult<bool> {
        let entity = entity_id.as_int32()?;
        self.ensure_supported(&entity)?;

        let removed = self
            .lb
            .with_connection(ConnectionRole::Primary, |conn| writer::delete_row(conn, &entity))?;
        Ok(removed > 0)
    }

    fn clear(&self) -> IndexResult<usize> {
        let removed = self
            .lb
            .with_connection(ConnectionRole::Primary, writer::clear)?;
        Ok(removed)
    }

    fn list_entities(
        &self,
        entity_type: Option<&str>,
        limit: usize,
        after: Option<&EntityId>,
        redirects: RedirectFilter,
    ) -> IndexResult<Vec<EntityId>> {
        let after = validate_listing(entity_type, limit, after)?;
        let query = ListingQuery {
            entity_type,
            limit,
            after: after.as_ref(),
            redirects,
        };

        let rows = self
            .lb
            .with_connection(self.read_role, |conn| reader::list_rows(conn, &query))?;
        Ok(self.compose_ids(rows))
    }
}

impl EntitiesWithoutTermFinder for SqliteEntityPerPage {
    fn entities_without_term(&self, query: &TermGapQuery) -> IndexResult<Vec<EntityId>> {
        query.validate()?;

        let rows = self.lb.with_connection(self.read_role, |conn| {
            term_gaps::rows_without_term(conn, query)
        })?;
        Ok(self.compose_ids(rows))
    }
}

#[async_trait]
impl AsyncEntityPerPage for SqliteEntityPerPage {
    async fn put(
        &self,
        entity_id: EntityId,
        page_id: i64,
        redirect_target: Option<EntityId>,
    ) -> IndexResult<PutOutcome> {
        let table = self.clone();

        tokio::task::spawn_blocking(move || {
            EntityPerPage::put(&table, &entity_id, page_id, redirect_target.as_ref())
        })
        .await
        .map_err(|e| IndexError::Backend(e.to_string()))?
    }

    async fn delete_entity(&self, entity_id: EntityId) -> IndexResult<bool> {
        let table = self.clone();

        tokio::task::spawn_blocking(move || EntityPerPage::delete_entity(&table, &entity_id))
            .await
            .map_err(|e| IndexError::Backend(e.to_string()))?
    }

    async fn clear(&self) -> IndexResult<usize> {
        let table = self.clone();

        tokio::task::spawn_blocking(move || EntityPerPage::clear(&table))
            .await
            .map_err(|e| IndexError::Backend(e.to_string()))?
    }

    async fn list_entities(
        &self,
        entity_type: Option<String>,
        limit: usize,
        after: Option<EntityId>,
        redirects: RedirectFilter,
    ) -> IndexResult<Vec<EntityId>> {
        let table = self.clone();

        tokio::task::spawn_blocking(move || {
            EntityPerPage::list_entities(
                &table,
                entity_type.as_deref(),
                limit,
                after.as_ref(),
                redirects,
            )
        })
        .await
        .map_err(|e| IndexError::Backend(e.to_string()))?
    }

    async fn entities_without_term(&self, query: TermGapQuery) -> IndexResult<Vec<EntityId>> {
        let table = self.clone();

        tokio::task::spawn_blocking(move || {
            EntitiesWithoutTermFinder::entities_without_term(&table, &query)
        })
        .await
        .map_err(|e| IndexError::Backend(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemap_core::{ITEM, PROPERTY};
    use tracing_test::traced_test;

    fn table() -> SqliteEntityPerPage {
        SqliteEntityPerPage::new(SqliteLoadBalancer::memory().unwrap())
    }

    fn insert_raw(table: &SqliteEntityPerPage, numeric_id: i64, entity_type: &str, page_id: i64) {
        table
            .load_balancer()
            .with_connection(ConnectionRole::Primary, |conn| {
                conn.execute(
                    "INSERT INTO entity_per_page (epp_entity_id, epp_entity_type, epp_page_id) VALUES (?1, ?2, ?3)",
                    rusqlite::params![numeric_id, entity_type, page_id],
                )?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_put_rejects_invalid_input() {
        let table = table();

        let err = EntityPerPage::put(&table, &EntityId::item(1), 0, None).unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));

        let err = EntityPerPage::put(&table, &EntityId::item(1 << 31), 1, None).unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));

        let err = EntityPerPage::put(&table, &EntityId::opaque("form", "L1-F1"), 1, None)
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));
    }

    #[test]
    fn test_put_rejects_unknown_type() {
        let table = table();
        let lexeme = EntityId::numeric("lexeme", 'L', 1);

        let err = EntityPerPage::put(&table, &lexeme, 1, None).unwrap_err();
        assert_eq!(err, IndexError::UnsupportedType("lexeme".into()));

        let err = EntityPerPage::delete_entity(&table, &lexeme).unwrap_err();
        assert_eq!(err, IndexError::UnsupportedType("lexeme".into()));
    }

    #[test]
    fn test_custom_composer_accepts_extra_type() {
        let codec = PrefixedIdCodec::default().with_type("lexeme", 'L');
        let table = table().with_composer(Arc::new(codec));
        let lexeme = EntityId::numeric("lexeme", 'L', 1);

        EntityPerPage::put(&table, &lexeme, 1, None).unwrap();
        let ids = EntityPerPage::list_entities(&table, Some("lexeme"), 10, None, RedirectFilter::All)
            .unwrap();
        assert_eq!(ids, vec![lexeme]);
    }

    #[test]
    #[traced_test]
    fn test_listing_skips_unknown_type_rows() {
        let table = table();
        insert_raw(&table, 1, ITEM, 1);
        insert_raw(&table, 1, "lexeme", 2);
        insert_raw(&table, 2, PROPERTY, 3);

        let ids = EntityPerPage::list_entities(&table, None, 10, None, RedirectFilter::All).unwrap();
        assert_eq!(ids, vec![EntityId::item(1), EntityId::property(2)]);
        assert!(logs_contain("Unsupported entity type in index row, skipping"));
    }

    #[test]
    fn test_listing_validation() {
        let table = table();

        let err = EntityPerPage::list_entities(&table, None, 0, None, RedirectFilter::All)
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));

        let err = EntityPerPage::list_entities(&table, Some(""), 1, None, RedirectFilter::All)
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));

        let wide = EntityId::item(u64::from(u32::MAX));
        let err = EntityPerPage::list_entities(&table, None, 1, Some(&wide), RedirectFilter::All)
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));
    }

    #[test]
    fn test_untyped_keyset_crosses_types_at_same_id() {
        let table = table();
        EntityPerPage::put(&table, &EntityId::item(1), 1, None).unwrap();
        EntityPerPage::put(&table, &EntityId::property(1), 2, None).unwrap();
        EntityPerPage::put(&table, &EntityId::item(2), 3, None).unwrap();

        let after_item = EntityPerPage::list_entities(
            &table,
            None,
            10,
            Some(&EntityId::item(1)),
            RedirectFilter::All,
        )
        .unwrap();
        assert_eq!(after_item, vec![EntityId::property(1), EntityId::item(2)]);

        let after_property = EntityPerPage::list_entities(
            &table,
            None,
            10,
            Some(&EntityId::property(1)),
            RedirectFilter::All,
        )
        .unwrap();
        assert_eq!(after_property, vec![EntityId::item(2)]);
    }

    #[test]
    fn test_term_gap_rejects_zero_limit() {
        let table = table();
        let query = TermGapQuery::new(pagemap_core::TermType::Label).with_limit(0);
        let err = EntitiesWithoutTermFinder::entities_without_term(&table, &query).unwrap_err();
        assert!(matches!(err, IndexError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_async_surface() {
        let table = table();

        let outcome = AsyncEntityPerPage::put(&table, EntityId::item(5), 50, None)
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Inserted);

        AsyncEntityPerPage::put(&table, EntityId::item(6), 60, Some(EntityId::item(5)))
            .await
            .unwrap();

        let redirects = AsyncEntityPerPage::list_entities(
            &table,
            Some(ITEM.to_string()),
            10,
            None,
            RedirectFilter::OnlyRedirects,
        )
        .await
        .unwrap();
        assert_eq!(redirects, vec![EntityId::item(6)]);

        let gaps = AsyncEntityPerPage::entities_without_term(
            &table,
            TermGapQuery::new(pagemap_core::TermType::Label),
        )
        .await
        .unwrap();
        assert_eq!(gaps, vec![EntityId::item(5)]);

        assert!(AsyncEntityPerPage::delete_entity(&table, EntityId::item(5))
            .await
            .unwrap());
        assert_eq!(AsyncEntityPerPage::clear(&table).await.unwrap(), 1);
    }
}
