//! Administrative rebuild of the index from page data

use crate::error::IndexResult;
use crate::id::EntityId;
use crate::index::{EntityPerPage, PutOutcome};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One page's contribution to the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub entity_id: EntityId,
    pub page_id: i64,
    pub redirect_target: Option<EntityId>,
}

impl PageEntry {
    pub fn entity(entity_id: EntityId, page_id: i64) -> Self {
        Self {
            entity_id,
            page_id,
            redirect_target: None,
        }
    }

    pub fn redirect(entity_id: EntityId, page_id: i64, target: EntityId) -> Self {
        Self {
            entity_id,
            page_id,
            redirect_target: Some(target),
        }
    }
}

/// Configuration for [`EntityPerPageRebuilder`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Truncate the index before writing
    pub clear_first: bool,

    /// Log progress every N entries (0 disables progress logging)
    pub progress_interval: usize,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            clear_first: false,
            progress_interval: 1000,
        }
    }
}

/// Counters reported after a rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub processed: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Re-populates an index from an iterator of page entries
pub struct EntityPerPageRebuilder<'a, S: EntityPerPage + ?Sized> {
    index: &'a S,
    config: RebuildConfig,
}

impl<'a, S: EntityPerPage + ?Sized> EntityPerPageRebuilder<'a, S> {
    pub fn new(index: &'a S, config: RebuildConfig) -> Self {
        Self { index, config }
    }

    /// Write every entry; caller errors skip the entry, anything else aborts
    pub fn rebuild<I>(&self, entries: I) -> IndexResult<RebuildStats>
    where
        I: IntoIterator<Item = PageEntry>,
    {
        if self.config.clear_first {
            let removed = self.index.clear()?;
            info!(removed, "Cleared entity-per-page index before rebuild");
        }

        let mut stats = RebuildStats::default();

        for entry in entries {
            stats.processed += 1;

            match self.index.put(
                &entry.entity_id,
                entry.page_id,
                entry.redirect_target.as_ref(),
            ) {
                Ok(PutOutcome::Inserted) => stats.inserted += 1,
                Ok(PutOutcome::Replaced { .. }) => stats.replaced += 1,
                Ok(PutOutcome::Unchanged) => stats.unchanged += 1,
                Err(err) if err.is_caller_error() => {
                    warn!(
                        entity_id = %entry.entity_id,
                        page_id = entry.page_id,
                        error = %err,
                        "Skipping page entry during rebuild"
                    );
                    stats.skipped += 1;
                }
                Err(err) => return Err(err),
            }

            if self.config.progress_interval > 0
                && stats.processed % self.config.progress_interval == 0
            {
                info!(processed = stats.processed, "Rebuild progress");
            }
        }

        info!(
            processed = stats.processed,
            inserted = stats.inserted,
            replaced = stats.replaced,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            "Rebuild finished"
        );

        Ok(stats)
    }
}
