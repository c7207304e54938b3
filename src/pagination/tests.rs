//! Tests for pagination module

use super::paginator::LinkState;
use super::*;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::source::{MemorySource, RecordSource};
use crate::types::{JsonObject, OrderKey, Ordering, MAX_OFFSET};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;
use url::Url;

const BASE_URL: &str = "http://testserver/api/categories";

fn categories(titles: &[&str]) -> MemorySource {
    let values = titles.iter().map(|t| json!({ "title": t })).collect();
    MemorySource::from_values(values)
        .unwrap()
        .ordered_by(Ordering::new(vec![OrderKey::asc("title")]))
}

fn titles(envelope: &Envelope<JsonObject>) -> Vec<&str> {
    envelope
        .results
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect()
}

/// Run one request against `source` the way an HTTP handler would
async fn request<S: RecordSource<Record = JsonObject>>(
    source: &S,
    url: &str,
) -> Result<Envelope<JsonObject>> {
    let url = Url::parse(url).unwrap();
    let mut query = PaginationQuery::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "limit" => query.limit = Some(value.into_owned()),
            "cursor" => query.cursor = Some(value.into_owned()),
            _ => {}
        }
    }

    let params = query.validate()?;
    let page = CursorPaginator::default().paginate(source, &params).await?;
    Ok(page.into_envelope(&url))
}

async fn get<S: RecordSource<Record = JsonObject>>(source: &S, url: &str) -> Envelope<JsonObject> {
    request(source, url).await.unwrap()
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_query_defaults() {
    let params = PaginationQuery::default().validate().unwrap();
    assert_eq!(params.limit(), 100);
    assert!(params.cursor().is_start());
}

#[test]
fn test_query_limit_bounds() {
    let query = |limit: &str| PaginationQuery {
        limit: Some(limit.to_string()),
        cursor: None,
    };

    assert_eq!(query("0").validate().unwrap().limit(), 0);
    assert_eq!(query("100").validate().unwrap().limit(), 100);

    for bad in ["-1", "101", "abc", "1.5"] {
        let err = query(bad).validate().unwrap_err();
        assert_eq!(err.field(), Some("limit"), "{bad}");
    }
}

#[test]
fn test_query_invalid_cursor() {
    let query = PaginationQuery {
        limit: None,
        cursor: Some("invalid".to_string()),
    };
    let err = query.validate().unwrap_err();

    assert!(matches!(err, Error::InvalidCursor));
    assert_eq!(err.field(), Some("cursor"));
    assert_eq!(err.to_string(), "Invalid cursor.");
}

#[test]
fn test_params_reject_large_limit() {
    assert!(PaginationParams::first(100).is_ok());
    assert!(matches!(
        PaginationParams::first(101),
        Err(Error::InvalidLimit { .. })
    ));
}

// ============================================================================
// Paging Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_single_page() {
    let source = categories(&["C", "E", "B", "D", "A"]);
    let page = get(&source, BASE_URL).await;

    assert_eq!(titles(&page), vec!["A", "B", "C", "D", "E"]);
    assert_eq!(page.count, 5);
    assert_eq!(page.next, None);
    assert_eq!(page.previous, None);
}

#[tokio::test]
async fn test_iteration_forward_and_back() {
    let source = categories(&["C", "E", "B", "D", "A"]);

    let first = get(&source, &format!("{BASE_URL}?limit=2")).await;
    assert_eq!(titles(&first), vec!["A", "B"]);
    assert_eq!(first.count, 5);
    assert!(first.next.is_some());
    assert!(first.previous.is_none());

    let second = get(&source, first.next.as_deref().unwrap()).await;
    assert_eq!(titles(&second), vec!["C", "D"]);
    assert_eq!(second.count, 5);
    assert!(second.next.is_some());
    assert!(second.previous.is_some());

    let back = get(&source, second.previous.as_deref().unwrap()).await;
    assert_eq!(titles(&back), vec!["A", "B"]);
    assert_eq!(back.count, 5);
    assert!(back.next.is_some());
    assert!(back.previous.is_none());

    let third = get(&source, second.next.as_deref().unwrap()).await;
    assert_eq!(titles(&third), vec!["E"]);
    assert!(third.next.is_none());
    assert!(third.previous.is_some());
}

#[tokio::test]
async fn test_links_keep_other_params() {
    let source = categories(&["A", "B", "C"]);
    let page = get(&source, &format!("{BASE_URL}?q=x&limit=1")).await;

    let next = Url::parse(page.next.as_deref().unwrap()).unwrap();
    let keys: Vec<String> = next.query_pairs().map(|(k, _)| k.into_owned()).collect();
    assert_eq!(keys, vec!["cursor", "limit", "q"]);
    assert_eq!(next.path(), "/api/categories");
}

#[tokio::test]
async fn test_duplicates() {
    let source = categories(&["A", "B", "B", "B", "C"]);

    let page = get(&source, &format!("{BASE_URL}?limit=2")).await;
    assert_eq!(titles(&page), vec!["A", "B"]);

    let page = get(&source, page.next.as_deref().unwrap()).await;
    assert_eq!(titles(&page), vec!["B", "B"]);

    let page = get(&source, page.next.as_deref().unwrap()).await;
    assert_eq!(titles(&page), vec!["C"]);
    assert!(page.next.is_none());

    let page = get(&source, page.previous.as_deref().unwrap()).await;
    assert_eq!(titles(&page), vec!["B", "B"]);
    assert!(page.next.is_some());
}

#[tokio::test]
async fn test_duplicates_cursor_offsets() {
    let source = categories(&["A", "B", "B", "B", "C"]);
    let params = PaginationParams::first(2).unwrap();
    let paginator = CursorPaginator::default();

    let page = paginator.paginate(&source, &params).await.unwrap();
    let next = page.next_cursor.unwrap();
    // "B" closes the page, so the pivot is "A" and one "B" is skipped
    assert_eq!(next, Cursor::new(1, false, Some("A".to_string())).unwrap());

    let params = PaginationParams::new(2, next).unwrap();
    let page = paginator.paginate(&source, &params).await.unwrap();
    assert_eq!(
        page.next_cursor.unwrap(),
        Cursor::new(0, false, Some("B".to_string())).unwrap()
    );
    // Whole page is one run and the direction changes: resume before "C"
    assert_eq!(
        page.previous_cursor.unwrap(),
        Cursor::new(0, true, Some("C".to_string())).unwrap()
    );
}

#[tokio::test]
async fn test_all_duplicates_first_page_resumes_by_count() {
    let source = categories(&["B", "B", "B", "B", "B"]);
    let paginator = CursorPaginator::default();

    let page = paginator
        .paginate(&source, &PaginationParams::first(2).unwrap())
        .await
        .unwrap();
    let next = page.next_cursor.unwrap();
    assert_eq!(next, Cursor::new(2, false, None).unwrap());

    let page = paginator
        .paginate(&source, &PaginationParams::new(2, next).unwrap())
        .await
        .unwrap();
    assert_eq!(page.results.len(), 2);
    assert!(page.has_previous);
    // Continuing forward in the run adds the page size to the offset
    assert_eq!(
        page.next_cursor.unwrap(),
        Cursor::new(4, false, None).unwrap()
    );
}

#[tokio::test]
async fn test_default_ordering_is_descending_created() {
    let source = MemorySource::from_values(vec![
        json!({"title": "old", "created": "2024-01-01T00:00:00Z"}),
        json!({"title": "new", "created": "2024-03-01T00:00:00Z"}),
        json!({"title": "mid", "created": "2024-02-01T00:00:00Z"}),
    ])
    .unwrap();

    let first = get(&source, &format!("{BASE_URL}?limit=2")).await;
    assert_eq!(titles(&first), vec!["new", "mid"]);

    let second = get(&source, first.next.as_deref().unwrap()).await;
    assert_eq!(titles(&second), vec!["old"]);
    assert!(second.next.is_none());

    let back = get(&source, second.previous.as_deref().unwrap()).await;
    assert_eq!(titles(&back), vec!["new", "mid"]);
    assert!(back.previous.is_none());
}

#[tokio::test]
async fn test_numeric_leading_key() {
    let values = (1..=12).map(|n| json!({ "title": format!("t{n}"), "rank": n })).collect();
    let source = MemorySource::from_values(values)
        .unwrap()
        .ordered_by(Ordering::new(vec![OrderKey::asc("rank")]));

    let mut url = format!("{BASE_URL}?limit=5");
    let mut seen = Vec::new();
    loop {
        let page = get(&source, &url).await;
        seen.extend(page.results.iter().map(|r| r["rank"].as_i64().unwrap()));
        match page.next {
            Some(next) => url = next,
            None => break,
        }
    }

    assert_eq!(seen, (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_refetch_is_idempotent() {
    let source = categories(&["A", "B", "B", "B", "C"]);
    let first = get(&source, &format!("{BASE_URL}?limit=2")).await;
    let next = first.next.unwrap();

    let a = get(&source, &next).await;
    let b = get(&source, &next).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_limit_zero() {
    let source = categories(&["A", "B"]);
    let page = get(&source, &format!("{BASE_URL}?limit=0")).await;
    assert!(page.results.is_empty());
    assert_eq!(page.count, 2);
    assert!(page.next.is_some());
    assert!(page.previous.is_none());

    let empty = categories(&[]);
    let page = get(&empty, &format!("{BASE_URL}?limit=0")).await;
    assert!(page.results.is_empty());
    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
}

#[tokio::test]
async fn test_empty_source() {
    let page = get(&categories(&[]), BASE_URL).await;
    assert!(page.results.is_empty());
    assert_eq!(page.count, 0);
    assert!(page.next.is_none());
    assert!(page.previous.is_none());
}

#[tokio::test]
async fn test_missing_leading_field() {
    let source = MemorySource::from_values(vec![json!({"title": "A"}), json!({"other": 1})])
        .unwrap()
        .ordered_by(Ordering::new(vec![OrderKey::desc("title")]));

    let result = request(&source, &format!("{BASE_URL}?limit=1")).await;
    assert!(matches!(result, Err(Error::MissingField { .. })));
}

// ============================================================================
// Source Interaction Tests
// ============================================================================

/// Wraps a memory source and counts the storage calls made on any view
#[derive(Clone)]
struct CountingSource {
    inner: MemorySource,
    counts: Arc<AtomicUsize>,
    slices: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingSource {
    fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            counts: Arc::new(AtomicUsize::new(0)),
            slices: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    fn wrap(&self, inner: MemorySource) -> Self {
        Self {
            inner,
            ..self.clone()
        }
    }
}

#[async_trait]
impl RecordSource for CountingSource {
    type Record = JsonObject;

    fn ordering(&self) -> Option<&Ordering> {
        self.inner.ordering()
    }

    fn with_order(&self, ordering: Ordering) -> Self {
        self.wrap(self.inner.with_order(ordering))
    }

    fn filter_lt(&self, field: &str, value: &str) -> Self {
        self.wrap(self.inner.filter_lt(field, value))
    }

    fn filter_gt(&self, field: &str, value: &str) -> Self {
        self.wrap(self.inner.filter_gt(field, value))
    }

    async fn count(&self) -> Result<u64> {
        self.counts.fetch_add(1, AtomicOrdering::SeqCst);
        if self.fail {
            return Err(Error::record_source("connection reset"));
        }
        self.inner.count().await
    }

    async fn slice(&self, skip: u64, take: u64) -> Result<Vec<JsonObject>> {
        self.slices.fetch_add(1, AtomicOrdering::SeqCst);
        self.inner.slice(skip, take).await
    }
}

#[tokio::test]
async fn test_one_count_and_one_slice_per_call() {
    let source = CountingSource::new(categories(&["A", "B", "B", "B", "C"]));

    let first = get(&source, &format!("{BASE_URL}?limit=2")).await;
    get(&source, first.next.as_deref().unwrap()).await;

    assert_eq!(source.counts.load(AtomicOrdering::SeqCst), 2);
    assert_eq!(source.slices.load(AtomicOrdering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_cursor_never_queries() {
    let source = CountingSource::new(categories(&["A"]));

    let result = request(&source, &format!("{BASE_URL}?cursor=invalid")).await;
    assert!(matches!(result, Err(Error::InvalidCursor)));
    assert_eq!(source.counts.load(AtomicOrdering::SeqCst), 0);
    assert_eq!(source.slices.load(AtomicOrdering::SeqCst), 0);
}

#[tokio::test]
async fn test_source_errors_propagate_unchanged() {
    let mut source = CountingSource::new(categories(&["A"]));
    source.fail = true;

    let result = request(&source, BASE_URL).await;
    match result {
        Err(Error::Source { message }) => assert_eq!(message, "connection reset"),
        other => panic!("Expected source error, got {other:?}"),
    }
    assert_eq!(source.slices.load(AtomicOrdering::SeqCst), 0);
}

// ============================================================================
// Link Cursor Tests
// ============================================================================

fn positions(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[test]
fn test_next_cursor_walks_trailing_run() {
    let cursor = Cursor::start();
    let state = LinkState {
        cursor: &cursor,
        limit: 4,
        has_next: true,
        has_previous: false,
        next_position: Some("C"),
        previous_position: None,
    };

    // Following record is "C", so the walk stops at the first "B"
    let next = state.next_cursor(&positions(&["A", "A", "B", "C"])).unwrap();
    assert_eq!(next, Cursor::new(1, false, Some("B".to_string())).unwrap());

    let next = state.next_cursor(&positions(&["A", "B", "C", "C"])).unwrap();
    assert_eq!(next, Cursor::new(2, false, Some("B".to_string())).unwrap());
}

#[test]
fn test_previous_cursor_on_final_run_resumes_by_count() {
    let cursor = Cursor::new(0, true, Some("Z".to_string())).unwrap();
    let state = LinkState {
        cursor: &cursor,
        limit: 3,
        has_next: false,
        has_previous: true,
        next_position: None,
        previous_position: Some("B"),
    };

    let previous = state.previous_cursor(&positions(&["B", "B", "B"])).unwrap();
    assert_eq!(previous, Cursor::new(3, true, None).unwrap());
}

#[test]
fn test_empty_page_links_use_positions() {
    let cursor = Cursor::new(0, false, Some("M".to_string())).unwrap();
    let state = LinkState {
        cursor: &cursor,
        limit: 0,
        has_next: true,
        has_previous: true,
        next_position: Some("N"),
        previous_position: Some("M"),
    };

    assert_eq!(
        state.next_cursor(&[]).unwrap(),
        Cursor::new(0, false, Some("N".to_string())).unwrap()
    );
    assert_eq!(
        state.previous_cursor(&[]).unwrap(),
        Cursor::new(0, true, Some("M".to_string())).unwrap()
    );
}

#[test]
fn test_run_past_max_offset_overflows() {
    let cursor = Cursor::new(MAX_OFFSET, false, Some("A".to_string())).unwrap();
    let state = LinkState {
        cursor: &cursor,
        limit: 2,
        has_next: true,
        has_previous: true,
        next_position: Some("B"),
        previous_position: Some("A"),
    };

    let result = state.next_cursor(&positions(&["B", "B"]));
    assert!(matches!(result, Err(Error::OffsetOverflow { .. })));
}
