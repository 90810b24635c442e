//! Integration tests for the SQLite entity-per-page index
//!
//! Exercises the public surface against a real schema: writer conflict
//! handling, listing, redirects, deletion, term gaps and replica routing.

use pagemap_core::{
    EntitiesWithoutTermFinder, EntityId, EntityIdPager, EntityPerPage, EntityPerPageRebuilder,
    PageEntry, PutOutcome, RebuildConfig, RedirectFilter, Term, TermGapQuery, TermType, ITEM,
};
use pagemap_sqlite::{SqliteConfig, SqliteEntityPerPage, SqliteLoadBalancer, SqliteTermStore};
use proptest::prelude::*;
use std::collections::BTreeSet;
use tempfile::TempDir;

// ============================================================================
// HELPERS
// ============================================================================

fn memory_table() -> SqliteEntityPerPage {
    SqliteEntityPerPage::new(SqliteLoadBalancer::memory().unwrap())
}

fn list_all(table: &SqliteEntityPerPage) -> Vec<EntityId> {
    table
        .list_entities(None, 10_000, None, RedirectFilter::All)
        .unwrap()
}

/// Page through the index until an empty page comes back
fn drain(
    table: &SqliteEntityPerPage,
    entity_type: Option<&str>,
    limit: usize,
) -> Vec<EntityId> {
    let mut pager = EntityIdPager::new(table, entity_type, RedirectFilter::ExcludeRedirects);
    let mut seen = Vec::new();
    loop {
        let batch = pager.fetch_ids(limit).unwrap();
        if batch.is_empty() {
            return seen;
        }
        assert!(batch.len() <= limit);
        seen.extend(batch);
    }
}

// ============================================================================
// WRITER
// ============================================================================

#[test]
fn test_put_then_listed_once() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(42), 1042).unwrap();

    assert_eq!(list_all(&table), vec![EntityId::item(42)]);
}

#[test]
fn test_put_is_idempotent() {
    let table = memory_table();

    assert_eq!(
        table.add_entity_page(&EntityId::item(1), 10).unwrap(),
        PutOutcome::Inserted
    );
    assert_eq!(
        table.add_entity_page(&EntityId::item(1), 10).unwrap(),
        PutOutcome::Unchanged
    );
    assert_eq!(list_all(&table), vec![EntityId::item(1)]);
}

#[test]
fn test_same_page_new_entity_replaces() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();

    let outcome = table.add_entity_page(&EntityId::item(2), 10).unwrap();
    assert_eq!(outcome, PutOutcome::Replaced { removed: 1 });
    assert_eq!(list_all(&table), vec![EntityId::item(2)]);
}

#[test]
fn test_same_entity_new_page_replaces() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table.add_entity_page(&EntityId::item(1), 11).unwrap();
    assert_eq!(list_all(&table), vec![EntityId::item(1)]);

    // Page 10 is free again
    assert_eq!(
        table.add_entity_page(&EntityId::item(2), 10).unwrap(),
        PutOutcome::Inserted
    );
}

#[test]
fn test_numeric_id_shared_across_types() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(7), 1).unwrap();
    table.add_entity_page(&EntityId::property(7), 2).unwrap();

    assert_eq!(
        list_all(&table),
        vec![EntityId::item(7), EntityId::property(7)]
    );
}

// ============================================================================
// REDIRECTS
// ============================================================================

#[test]
fn test_redirect_filters() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table
        .add_redirect_page(&EntityId::item(2), 20, &EntityId::item(1))
        .unwrap();

    let primary = table
        .list_entities(None, 10, None, RedirectFilter::ExcludeRedirects)
        .unwrap();
    assert_eq!(primary, vec![EntityId::item(1)]);

    let redirects = table
        .list_entities(None, 10, None, RedirectFilter::OnlyRedirects)
        .unwrap();
    assert_eq!(redirects, vec![EntityId::item(2)]);

    assert_eq!(list_all(&table).len(), 2);
}

#[test]
fn test_entity_becomes_redirect_and_back() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(2), 20).unwrap();

    table
        .add_redirect_page(&EntityId::item(2), 20, &EntityId::item(1))
        .unwrap();
    assert!(table
        .list_entities(None, 10, None, RedirectFilter::ExcludeRedirects)
        .unwrap()
        .is_empty());

    table.add_entity_page(&EntityId::item(2), 20).unwrap();
    assert_eq!(
        table
            .list_entities(None, 10, None, RedirectFilter::ExcludeRedirects)
            .unwrap(),
        vec![EntityId::item(2)]
    );
    assert_eq!(list_all(&table).len(), 1);
}

// ============================================================================
// DELETE / CLEAR
// ============================================================================

#[test]
fn test_delete_entity() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table.add_entity_page(&EntityId::item(2), 20).unwrap();

    assert!(table.delete_entity(&EntityId::item(1)).unwrap());
    assert_eq!(list_all(&table), vec![EntityId::item(2)]);

    // Already gone is not an error
    assert!(!table.delete_entity(&EntityId::item(1)).unwrap());
}

#[test]
fn test_delete_entity_page_ignores_page_id() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();

    assert!(table.delete_entity_page(&EntityId::item(1), 999).unwrap());
    assert!(list_all(&table).is_empty());
}

#[test]
fn test_clear_empties_every_view() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table.add_entity_page(&EntityId::property(1), 11).unwrap();
    table
        .add_redirect_page(&EntityId::item(3), 30, &EntityId::item(1))
        .unwrap();

    assert_eq!(table.clear().unwrap(), 3);

    for filter in [
        RedirectFilter::ExcludeRedirects,
        RedirectFilter::OnlyRedirects,
        RedirectFilter::All,
    ] {
        assert!(table.list_entities(None, 10, None, filter).unwrap().is_empty());
        assert!(table
            .list_entities(Some(ITEM), 10, None, filter)
            .unwrap()
            .is_empty());
    }
}

// ============================================================================
// LISTING
// ============================================================================

#[test]
fn test_typed_listing_pages() {
    let table = memory_table();
    for n in 1..=5 {
        table.add_entity_page(&EntityId::item(n), n as i64).unwrap();
    }
    table.add_entity_page(&EntityId::property(3), 100).unwrap();

    let first = table
        .list_entities(Some(ITEM), 2, None, RedirectFilter::default())
        .unwrap();
    assert_eq!(first, vec![EntityId::item(1), EntityId::item(2)]);

    let second = table
        .list_entities(Some(ITEM), 2, first.last(), RedirectFilter::default())
        .unwrap();
    assert_eq!(second, vec![EntityId::item(3), EntityId::item(4)]);

    let third = table
        .list_entities(Some(ITEM), 2, second.last(), RedirectFilter::default())
        .unwrap();
    assert_eq!(third, vec![EntityId::item(5)]);

    let done = table
        .list_entities(Some(ITEM), 2, third.last(), RedirectFilter::default())
        .unwrap();
    assert!(done.is_empty());
}

#[test]
fn test_unknown_type_filter_is_empty() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(1), 1).unwrap();

    assert!(table
        .list_entities(Some("lexeme"), 10, None, RedirectFilter::All)
        .unwrap()
        .is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_typed_pagination_is_complete(
        (ids, limit) in prop::collection::btree_set(1u64..5_000, 1..40)
            .prop_flat_map(|ids| {
                let n = ids.len();
                (Just(ids), 1..=n)
            })
    ) {
        let table = memory_table();
        for (page, n) in ids.iter().enumerate() {
            table.add_entity_page(&EntityId::item(*n), page as i64 + 1).unwrap();
        }

        let seen = drain(&table, Some(ITEM), limit);
        let expected: Vec<_> = ids.iter().copied().map(EntityId::item).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_untyped_pagination_follows_id_then_type(
        (entries, limit) in prop::collection::btree_set((1u64..200, any::<bool>()), 1..40)
            .prop_flat_map(|entries| {
                let n = entries.len();
                (Just(entries), 1..=n)
            })
    ) {
        let table = memory_table();
        let ids: Vec<EntityId> = entries
            .iter()
            .map(|(n, is_item)| if *is_item { EntityId::item(*n) } else { EntityId::property(*n) })
            .collect();
        for (page, id) in ids.iter().enumerate() {
            table.add_entity_page(id, page as i64 + 1).unwrap();
        }

        let seen = drain(&table, None, limit);

        let mut expected = ids.clone();
        expected.sort_by(|a, b| {
            (a.numeric_id(), a.entity_type()).cmp(&(b.numeric_id(), b.entity_type()))
        });
        let unique: BTreeSet<_> = seen.iter().map(|id| id.serialization().to_string()).collect();
        prop_assert_eq!(unique.len(), seen.len());
        prop_assert_eq!(seen, expected);
    }
}

// ============================================================================
// TERM GAPS
// ============================================================================

#[test]
fn test_term_gap_scenario() {
    let lb = SqliteLoadBalancer::memory().unwrap();
    let table = SqliteEntityPerPage::new(lb.clone());
    let terms = SqliteTermStore::new(lb);

    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table.add_entity_page(&EntityId::item(2), 20).unwrap();
    terms
        .save_terms(&EntityId::item(2), &[Term::label("en", "two")])
        .unwrap();

    let query = TermGapQuery::new(TermType::Label).with_language("en");
    assert_eq!(
        table.entities_without_term(&query).unwrap(),
        vec![EntityId::item(1)]
    );
}

#[test]
fn test_term_gap_language_and_type_filters() {
    let lb = SqliteLoadBalancer::memory().unwrap();
    let table = SqliteEntityPerPage::new(lb.clone());
    let terms = SqliteTermStore::new(lb);

    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    table.add_entity_page(&EntityId::item(2), 20).unwrap();
    table.add_entity_page(&EntityId::item(3), 30).unwrap();
    table.add_entity_page(&EntityId::property(1), 40).unwrap();
    terms
        .save_terms(&EntityId::item(2), &[Term::label("de", "zwei")])
        .unwrap();
    terms
        .save_terms(&EntityId::item(3), &[Term::description("en", "three")])
        .unwrap();

    // Any language: only Q2 has a label
    let any_language = TermGapQuery::new(TermType::Label);
    assert_eq!(
        table.entities_without_term(&any_language).unwrap(),
        vec![EntityId::property(1), EntityId::item(3), EntityId::item(1)]
    );

    // English labels: nobody has one
    let english = TermGapQuery::new(TermType::Label).with_language("en");
    assert_eq!(table.entities_without_term(&english).unwrap().len(), 4);

    let items_only = TermGapQuery::new(TermType::Label).with_entity_type(ITEM);
    assert_eq!(
        table.entities_without_term(&items_only).unwrap(),
        vec![EntityId::item(3), EntityId::item(1)]
    );

    let descriptions = TermGapQuery::new(TermType::Description).with_language("en");
    assert_eq!(
        table.entities_without_term(&descriptions).unwrap(),
        vec![EntityId::property(1), EntityId::item(2), EntityId::item(1)]
    );
}

#[test]
fn test_term_gap_excludes_redirects_and_pages_by_offset() {
    let table = memory_table();
    for n in 1..=5 {
        table.add_entity_page(&EntityId::item(n), n as i64 * 10).unwrap();
    }
    table
        .add_redirect_page(&EntityId::item(6), 60, &EntityId::item(1))
        .unwrap();

    let first = TermGapQuery::new(TermType::Label).with_limit(2);
    assert_eq!(
        table.entities_without_term(&first).unwrap(),
        vec![EntityId::item(5), EntityId::item(4)]
    );

    let second = first.clone().with_offset(2);
    assert_eq!(
        table.entities_without_term(&second).unwrap(),
        vec![EntityId::item(3), EntityId::item(2)]
    );

    let last = first.with_offset(4);
    assert_eq!(
        table.entities_without_term(&last).unwrap(),
        vec![EntityId::item(1)]
    );
}

// ============================================================================
// ROUTING / CONCURRENCY / REBUILD
// ============================================================================

#[test]
fn test_file_backed_replica_reads() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig::new(dir.path().join("index.db")).with_replica_reads(true);
    let table = SqliteEntityPerPage::open(config.clone()).unwrap();
    assert!(table.load_balancer().has_replica());

    table.add_entity_page(&EntityId::item(1), 10).unwrap();
    assert_eq!(list_all(&table), vec![EntityId::item(1)]);

    // Reopening sees the persisted rows
    drop(table);
    let reopened = SqliteEntityPerPage::open(config).unwrap().reads_from_primary();
    assert_eq!(list_all(&reopened), vec![EntityId::item(1)]);
}

#[test]
fn test_concurrent_writers_on_distinct_entities() {
    let table = memory_table();

    let handles: Vec<_> = (0..8u64)
        .map(|worker| {
            let table = table.clone();
            std::thread::spawn(move || {
                for i in 0..25u64 {
                    let n = worker * 100 + i + 1;
                    table.add_entity_page(&EntityId::item(n), n as i64).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(list_all(&table).len(), 200);
}

#[test]
fn test_rebuild_into_sqlite() {
    let table = memory_table();
    table.add_entity_page(&EntityId::item(99), 990).unwrap();

    let config = RebuildConfig {
        clear_first: true,
        progress_interval: 2,
    };
    let entries = vec![
        PageEntry::entity(EntityId::item(1), 10),
        PageEntry::entity(EntityId::property(1), 11),
        PageEntry::redirect(EntityId::item(2), 12, EntityId::item(1)),
        PageEntry::entity(EntityId::numeric("lexeme", 'L', 1), 13),
    ];

    let stats = EntityPerPageRebuilder::new(&table, config)
        .rebuild(entries)
        .unwrap();
    assert_eq!(stats.inserted, 3);
    assert_eq!(stats.skipped, 1);

    assert_eq!(
        list_all(&table),
        vec![EntityId::item(1), EntityId::property(1), EntityId::item(2)]
    );
}
