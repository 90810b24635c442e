//! Entity-per-page index traits
//!
//! The index maps an entity id to the page that stores it, with an optional
//! redirect target. Two independent uniqueness rules hold at all times:
//!
//! - `(numeric id, type)` appears at most once
//! - a page id appears at most once
//!
//! ## Traits
//!
//! - **EntityPerPage**: writer, reader, redirect and delete/clear surface
//! - **EntitiesWithoutTermFinder**: anti-join against the term store
//! - **AsyncEntityPerPage**: the same surface for callers on an async runtime

use crate::error::{IndexError, IndexResult};
use crate::id::{EntityId, Int32EntityId};
use crate::term::TermGapQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Row and filters
// ============================================================================

/// The single persisted record of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPageRow {
    pub entity: Int32EntityId,
    pub page_id: i64,
    /// Serialized target id when this row marks a redirect
    pub redirect_target: Option<String>,
}

impl EntityPageRow {
    /// Validate caller input and build a row
    ///
    /// Fails with `InvalidInput` if the id is outside the 32-bit numeric space
    /// or the page id is not strictly positive.
    pub fn new(
        entity_id: &EntityId,
        page_id: i64,
        redirect_target: Option<&EntityId>,
    ) -> IndexResult<Self> {
        let entity = entity_id.as_int32()?;
        if page_id <= 0 {
            return Err(IndexError::InvalidInput(format!(
                "page id must be greater than 0, got {page_id}"
            )));
        }

        Ok(Self {
            entity,
            page_id,
            redirect_target: redirect_target.map(|target| target.serialization().to_string()),
        })
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect_target.is_some()
    }
}

/// Which rows a listing should return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectFilter {
    /// Primary entities only
    #[default]
    ExcludeRedirects,
    /// Redirect rows only
    OnlyRedirects,
    All,
}

/// What a `put` actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// An identical row already existed
    Unchanged,
    /// Inserted without touching other rows
    Inserted,
    /// Conflicting rows were removed before inserting
    Replaced { removed: usize },
}

// ============================================================================
// Sync traits
// ============================================================================

/// Mapping between entities and the pages that store them
pub trait EntityPerPage: Send + Sync {
    /// Insert-or-replace the row for `entity_id`
    ///
    /// Any existing row sharing the entity id or the page id is replaced.
    fn put(
        &self,
        entity_id: &EntityId,
        page_id: i64,
        redirect_target: Option<&EntityId>,
    ) -> IndexResult<PutOutcome>;

    /// Remove the row for `entity_id`, returning whether one existed
    fn delete_entity(&self, entity_id: &EntityId) -> IndexResult<bool>;

    /// Remove every row, returning how many were removed
    fn clear(&self) -> IndexResult<usize>;

    /// List entity ids in index order, strictly after `after`
    ///
    /// Without a type filter the order is `(numeric id, type)`; with one it is
    /// the numeric id alone.
    fn list_entities(
        &self,
        entity_type: Option<&str>,
        limit: usize,
        after: Option<&EntityId>,
        redirects: RedirectFilter,
    ) -> IndexResult<Vec<EntityId>>;

    fn add_entity_page(&self, entity_id: &EntityId, page_id: i64) -> IndexResult<PutOutcome> {
        self.put(entity_id, page_id, None)
    }

    /// Record `entity_id` as a redirect to `target`
    fn add_redirect_page(
        &self,
        entity_id: &EntityId,
        page_id: i64,
        target: &EntityId,
    ) -> IndexResult<PutOutcome> {
        self.put(entity_id, page_id, Some(target))
    }

    /// The page id is not consulted; rows are keyed by entity
    fn delete_entity_page(&self, entity_id: &EntityId, _page_id: i64) -> IndexResult<bool> {
        self.delete_entity(entity_id)
    }
}

/// Finds indexed entities that lack a term of a given type
pub trait EntitiesWithoutTermFinder: Send + Sync {
    fn entities_without_term(&self, query: &TermGapQuery) -> IndexResult<Vec<EntityId>>;
}

// ============================================================================
// Async mirror
// ============================================================================

/// Async counterpart of [`EntityPerPage`] and [`EntitiesWithoutTermFinder`]
#[async_trait]
pub trait AsyncEntityPerPage: Send + Sync {
    async fn put(
        &self,
        entity_id: EntityId,
        page_id: i64,
        redirect_target: Option<EntityId>,
    ) -> IndexResult<PutOutcome>;

    async fn delete_entity(&self, entity_id: EntityId) -> IndexResult<bool>;

    async fn clear(&self) -> IndexResult<usize>;

    async fn list_entities(
        &self,
        entity_type: Option<String>,
        limit: usize,
        after: Option<EntityId>,
        redirects: RedirectFilter,
    ) -> IndexResult<Vec<EntityId>>;

    async fn entities_without_term(&self, query: TermGapQuery) -> IndexResult<Vec<EntityId>>;
}

/// Shared validation for listing parameters
pub fn validate_listing(
    entity_type: Option<&str>,
    limit: usize,
    after: Option<&EntityId>,
) -> IndexResult<Option<Int32EntityId>> {
    if entity_type == Some("") {
        return Err(IndexError::invalid_input("entity type filter must not be empty"));
    }
    if limit == 0 {
        return Err(IndexError::invalid_input("limit must be a positive integer"));
    }
    Ok(after.map(EntityId::as_int32).transpose()?)
}
