//! Core types for the entity-per-page index
//!
//! This crate defines the storage-agnostic half of the index: identifiers,
//! the error taxonomy, and the traits a storage backend implements.
//!
//! ## Modules
//!
//! - **id**: `EntityId`, the 32-bit capability view and the prefix codec
//! - **index**: `EntityPerPage`, `EntitiesWithoutTermFinder` and the async mirror
//! - **term**: term types and the term-gap query
//! - **pager**: keyset cursor for batch enumeration
//! - **rebuild**: administrative rebuild driver
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagemap_core::{EntityId, EntityPerPage, RedirectFilter};
//!
//! fn register<S: EntityPerPage>(index: &S) -> pagemap_core::IndexResult<()> {
//!     index.add_entity_page(&EntityId::item(42), 1042)?;
//!     let ids = index.list_entities(Some("item"), 100, None, RedirectFilter::default())?;
//!     assert_eq!(ids, vec![EntityId::item(42)]);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod id;
pub mod index;
pub mod pager;
pub mod rebuild;
pub mod term;

// Re-exports
pub use error::{IndexError, IndexResult};
pub use id::{
    EntityId, EntityIdComposer, EntityIdParser, IdError, Int32EntityId, PrefixedIdCodec, ITEM,
    PROPERTY,
};
pub use index::{
    AsyncEntityPerPage, EntitiesWithoutTermFinder, EntityPageRow, EntityPerPage, PutOutcome,
    RedirectFilter,
};
pub use pager::EntityIdPager;
pub use rebuild::{EntityPerPageRebuilder, PageEntry, RebuildConfig, RebuildStats};
pub use term::{Term, TermGapQuery, TermType, DEFAULT_TERM_GAP_LIMIT};
