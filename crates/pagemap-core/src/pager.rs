//! Keyset pager over an [`EntityPerPage`] index
//!
//! Walks the index in its natural order, remembering the last id it returned.
//! The position can be persisted and restored to resume a dump.

use crate::error::IndexResult;
use crate::id::EntityId;
use crate::index::{EntityPerPage, RedirectFilter};

/// Restartable cursor over entity ids
pub struct EntityIdPager<'a, S: EntityPerPage + ?Sized> {
    index: &'a S,
    entity_type: Option<String>,
    redirects: RedirectFilter,
    position: Option<EntityId>,
}

impl<'a, S: EntityPerPage + ?Sized> EntityIdPager<'a, S> {
    pub fn new(index: &'a S, entity_type: Option<&str>, redirects: RedirectFilter) -> Self {
        Self {
            index,
            entity_type: entity_type.map(str::to_string),
            redirects,
            position: None,
        }
    }

    /// Fetch up to `limit` ids after the current position and advance
    ///
    /// An empty result means the sequence is exhausted.
    pub fn fetch_ids(&mut self, limit: usize) -> IndexResult<Vec<EntityId>> {
        let ids = self.index.list_entities(
            self.entity_type.as_deref(),
            limit,
            self.position.as_ref(),
            self.redirects,
        )?;

        if let Some(last) = ids.last() {
            self.position = Some(last.clone());
        }

        Ok(ids)
    }

    /// Last id returned, `None` before the first fetch
    pub fn position(&self) -> Option<&EntityId> {
        self.position.as_ref()
    }

    pub fn set_position(&mut self, position: Option<EntityId>) {
        self.position = position;
    }
}
