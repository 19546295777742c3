//! Page-windowed population tests

mod common;

use common::{FixtureSource, abc_source, row2};
use rowmirror_cache::{Error, Parameter, Result, Row, RowCache, RowSource, Value};

fn numbered_source(n: i64) -> FixtureSource {
    FixtureSource::new((1..=n).map(|i| row2(i, &format!("r{}", i))).collect())
}

fn paged_cache(page_size: usize) -> RowCache {
    let mut cache = RowCache::new();
    cache.set_command("SELECT id, name FROM people");
    cache.set_page_size(page_size).unwrap();
    cache
}

fn collect_ids(cache: &mut RowCache) -> Vec<i64> {
    let mut ids = Vec::new();
    cache.before_first().unwrap();
    while cache.next().unwrap() {
        match cache.get(0).unwrap() {
            Value::I64(id) => ids.push(*id),
            other => panic!("unexpected cell {:?}", other),
        }
    }
    ids
}

#[test]
fn test_page_size_zero_fetches_everything() {
    let mut source = numbered_source(10);
    let mut cache = paged_cache(0);

    cache.populate(&mut source, 0).unwrap();
    assert_eq!(cache.size(), 10);
    assert!(!cache.next_page(&mut source).unwrap());
}

#[test]
fn test_paging_visits_every_row_exactly_once() {
    let mut source = numbered_source(6);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 0).unwrap();
    let mut seen = collect_ids(&mut cache);
    let mut pages = 1;
    while cache.next_page(&mut source).unwrap() {
        pages += 1;
        seen.extend(collect_ids(&mut cache));
    }

    assert_eq!(pages, 3);
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_partial_last_page() {
    let mut source = numbered_source(5);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 0).unwrap();
    assert!(cache.next_page(&mut source).unwrap());
    assert!(cache.next_page(&mut source).unwrap());
    assert_eq!(collect_ids(&mut cache), vec![5]);
    assert!(!cache.next_page(&mut source).unwrap());
}

#[test]
fn test_exhausted_next_page_leaves_prior_page() {
    let mut source = numbered_source(4);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 0).unwrap();
    assert!(cache.next_page(&mut source).unwrap());
    assert!(!cache.next_page(&mut source).unwrap());

    // Boundary policy: the last materialized page stays
    assert_eq!(collect_ids(&mut cache), vec![3, 4]);
}

#[test]
fn test_previous_page_returns_and_clamps() {
    let mut source = numbered_source(6);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 0).unwrap();
    assert!(!cache.previous_page(&mut source).unwrap());

    assert!(cache.next_page(&mut source).unwrap());
    assert!(cache.next_page(&mut source).unwrap());
    assert!(cache.previous_page(&mut source).unwrap());
    assert_eq!(collect_ids(&mut cache), vec![3, 4]);
    assert!(cache.previous_page(&mut source).unwrap());
    assert_eq!(collect_ids(&mut cache), vec![1, 2]);
    assert!(!cache.previous_page(&mut source).unwrap());
}

#[test]
fn test_populate_at_offset() {
    let mut source = numbered_source(6);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 3).unwrap();
    assert_eq!(collect_ids(&mut cache), vec![4, 5]);

    // The starting offset is the logical first page
    assert!(!cache.previous_page(&mut source).unwrap());
}

#[test]
fn test_paging_before_populate_is_premature() {
    let mut source = abc_source();
    let mut cache = paged_cache(2);

    assert!(matches!(
        cache.next_page(&mut source),
        Err(Error::InvalidCursorState(_))
    ));
    assert!(matches!(
        cache.previous_page(&mut source),
        Err(Error::InvalidCursorState(_))
    ));
}

#[test]
fn test_max_rows_bounds_total_materialization() {
    let mut source = numbered_source(10);
    let mut cache = paged_cache(2);
    cache.set_max_rows(3).unwrap();

    cache.populate(&mut source, 0).unwrap();
    let mut seen = collect_ids(&mut cache);
    while cache.next_page(&mut source).unwrap() {
        seen.extend(collect_ids(&mut cache));
    }

    // Budget of three rows across all pages, excess never fetched
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn test_over_serving_source_is_silently_truncated() {
    // A source that ignores the fetch limit entirely
    struct OverServing(Vec<Row>);
    impl RowSource for OverServing {
        fn fetch_page(
            &mut self,
            _command: &str,
            _params: &[Parameter],
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<Row>> {
            Ok(self.0.clone())
        }
    }

    let mut source = OverServing((1..=10).map(|i| row2(i, "x")).collect());
    let mut cache = paged_cache(4);

    cache.populate(&mut source, 0).unwrap();
    assert_eq!(cache.size(), 4);
}

#[test]
fn test_source_failure_is_population_error() {
    let mut source = abc_source();
    source.fail = true;
    let mut cache = paged_cache(0);

    assert!(matches!(
        cache.populate(&mut source, 0),
        Err(Error::Population(_))
    ));
}

#[test]
fn test_page_replacement_discards_staged_edits() {
    let mut source = numbered_source(4);
    let mut cache = paged_cache(2);

    cache.populate(&mut source, 0).unwrap();
    cache.first().unwrap();
    cache.update_column(1, Value::string("edited")).unwrap();

    assert!(cache.next_page(&mut source).unwrap());
    assert!(cache.previous_page(&mut source).unwrap());

    // The staged edit is gone; this is the documented data-loss hazard
    cache.first().unwrap();
    assert_eq!(cache.get(1).unwrap(), &Value::string("r1"));
}
