//! SQLite storage backend for the entity-per-page index
//!
//! This crate provides a SQLite-based implementation of the index traits
//! defined in `pagemap-core`.
//!
//! ## Features
//!
//! - **SqliteEntityPerPage**: insert-or-replace writer, keyset listing, redirects,
//!   delete/clear and the term-gap anti-join
//! - **SqliteTermStore**: minimal writer for the companion term table
//! - **Primary/replica routing**: writes on the primary, batch reads on an
//!   optional read-only connection
//! - **WAL Mode**: Optimized for concurrent read access with write-ahead logging
//! - **Thread Safety**: Arc<Mutex<Connection>> pattern for concurrent access
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagemap_core::{EntityId, EntityPerPage, RedirectFilter};
//! use pagemap_sqlite::{SqliteConfig, SqliteEntityPerPage};
//!
//! let table = SqliteEntityPerPage::open(SqliteConfig::new("./pagemap.db"))?;
//! table.add_entity_page(&EntityId::item(42), 1042)?;
//!
//! let ids = table.list_entities(None, 100, None, RedirectFilter::default())?;
//! ```

pub mod config;
pub mod connection;
pub mod entity_per_page;
pub mod error;
pub mod load_balancer;
pub mod schema;
pub mod term_store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use entity_per_page::SqliteEntityPerPage;
pub use error::{SqliteError, SqliteResult};
pub use load_balancer::{ConnectionRole, SqliteLoadBalancer};
pub use term_store::SqliteTermStore;
