mod common;

use common::{dyn_source, page, people, person, GatedSource, Person};
use lazyselect::query::{QueryCoordinator, QueryParams};
use lazyselect::{Filter, FilterSet, QueryError, QueryResult, QueryStatus};
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<(QueryStatus, usize, bool)>>>;

fn coordinator(source: &Arc<GatedSource>) -> (QueryCoordinator<Person, usize>, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let coordinator = QueryCoordinator::new(dyn_source(source)).with_result_handler(move |status, items, eos| {
        recorded.lock().unwrap().push((status.clone(), items.len(), eos));
    });
    (coordinator, calls)
}

#[tokio::test]
async fn test_later_issued_fetch_wins_when_earlier_resolves_last() {
    let source = GatedSource::new();
    let (mut coordinator, calls) = coordinator(&source);

    let seq_a = coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    let seq_b = coordinator
        .fetch_page(0, 10, &FilterSet::default().with(Filter::contains("name", "1")))
        .unwrap();
    assert!(seq_b > seq_a);
    source.wait_for_calls(2).await;

    source.resolve(1, page(0..3));
    let completion = coordinator.next_completion().await.unwrap();
    assert_eq!(completion.seq, seq_b);
    let outcome = coordinator.apply(completion).unwrap().expect("current fetch applies");
    assert_eq!(outcome.items, people(0..3));

    source.resolve(0, page(10..21));
    let completion = coordinator.next_completion().await.unwrap();
    assert_eq!(completion.seq, seq_a);
    assert!(coordinator.apply(completion).unwrap().is_none());

    // The superseded result neither reached the handler nor the history
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(coordinator.history().is_empty());
}

#[tokio::test]
async fn test_most_recent_fetch_wins_even_when_it_resolves_first() {
    let source = GatedSource::new();
    let (mut coordinator, calls) = coordinator(&source);

    let seq_b = coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    let seq_a = coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(2).await;

    source.resolve(1, page(0..11));
    let completion = coordinator.next_completion().await.unwrap();
    assert_eq!(completion.seq, seq_a);
    assert!(coordinator.apply(completion).unwrap().is_some());

    source.resolve(0, page(50..52));
    let completion = coordinator.next_completion().await.unwrap();
    assert_eq!(completion.seq, seq_b);
    assert!(coordinator.apply(completion).unwrap().is_none());

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(coordinator.history().peek(0).unwrap().last_item, Some(person(9)));
}

#[tokio::test]
async fn test_end_of_stream_from_overflow_probe() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    // Exactly a page: nothing beyond it
    coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(1).await;
    assert_eq!(source.request(0).limit, 11);
    source.resolve(0, page(0..10));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();
    assert!(outcome.is_end_of_stream);
    assert!(!outcome.forced_end_of_stream);
    assert_eq!(outcome.items.len(), 10);
    assert!(coordinator.history().is_empty());

    // One more than a page: trimmed, and the stream goes on
    coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(2).await;
    source.resolve(1, page(0..11));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();
    assert!(!outcome.is_end_of_stream);
    assert_eq!(outcome.items, people(0..10));

    let entry = coordinator.history().peek(0).unwrap();
    assert_eq!(entry.last_item, Some(person(9)));
    assert_eq!(entry.continuation, Some(11));
}

#[tokio::test]
async fn test_next_page_resumes_from_history() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(1).await;
    source.resolve(0, page(0..11));
    let completion = coordinator.next_completion().await.unwrap();
    coordinator.apply(completion).unwrap();

    coordinator.fetch_page(1, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(2).await;

    let request = source.request(1);
    assert_eq!(request.page_index, 1);
    assert_eq!(request.previous_item, Some(person(9)));
    assert_eq!(request.previous_continuation, Some(11));
    assert_eq!(request.limit, 11);
}

#[tokio::test]
async fn test_empty_page_after_first_forces_end_of_stream() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    for (call, ids) in [(0, 0..11), (1, 10..21)] {
        coordinator.fetch_page(call, 10, &FilterSet::default()).unwrap();
        source.wait_for_calls(call + 1).await;
        source.resolve(call, page(ids));
        let completion = coordinator.next_completion().await.unwrap();
        assert!(!coordinator.apply(completion).unwrap().unwrap().is_end_of_stream);
    }

    coordinator.fetch_page(2, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(3).await;
    source.resolve(2, Ok(QueryResult::new(Vec::new(), None)));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();

    assert_eq!(outcome.page_index, 2);
    assert!(outcome.is_end_of_stream);
    assert!(outcome.forced_end_of_stream);
    assert!(outcome.items.is_empty());
    assert_eq!(coordinator.history().last_index(), Some(1));
}

#[tokio::test]
async fn test_empty_first_page_is_plain_end_of_stream() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(1).await;
    source.resolve(0, Ok(QueryResult::new(Vec::new(), None)));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();

    assert!(outcome.is_end_of_stream);
    assert!(!outcome.forced_end_of_stream);
}

#[tokio::test]
async fn test_failure_reports_error_without_items() {
    let source = GatedSource::new();
    let (mut coordinator, calls) = coordinator(&source);

    coordinator.fetch_page(0, 10, &FilterSet::default()).unwrap();
    source.wait_for_calls(1).await;
    source.resolve(0, Err(QueryError::Network("connection reset".to_string())));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();

    assert_eq!(outcome.status.error(), Some("Network error: connection reset"));
    assert!(!outcome.status.is_loading());
    assert!(outcome.items.is_empty());
    assert!(!coordinator.is_in_flight());

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.error().is_some());
}

#[tokio::test]
async fn test_reconcile_only_fetches_for_active_changed_params() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    let mut params = QueryParams {
        is_active: false,
        page_index: 0,
        page_size: 10,
        filters: FilterSet::default(),
    };
    assert!(coordinator.reconcile(&params).is_none());

    params.is_active = true;
    assert!(coordinator.reconcile(&params).is_some());
    assert!(coordinator.reconcile(&params).is_none());

    params.filters = FilterSet::default().with(Filter::equals("id", 3));
    assert!(coordinator.reconcile(&params).is_some());

    // Deactivation drops whatever is in flight
    params.is_active = false;
    assert!(coordinator.reconcile(&params).is_none());
    assert!(!coordinator.is_in_flight());

    source.wait_for_calls(2).await;
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn test_reconcile_without_source_is_noop() {
    let mut coordinator: QueryCoordinator<Person, usize> = QueryCoordinator::new(None);
    let params = QueryParams {
        is_active: true,
        page_index: 0,
        page_size: 10,
        filters: FilterSet::default(),
    };
    assert!(coordinator.reconcile(&params).is_none());
    assert!(!coordinator.is_in_flight());
}

#[tokio::test]
async fn test_max_page_size_limit_saturates() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);

    coordinator.fetch_page(0, usize::MAX, &FilterSet::default()).unwrap();
    source.wait_for_calls(1).await;
    assert_eq!(source.request(0).limit, usize::MAX);

    source.resolve(0, page(0..3));
    let completion = coordinator.next_completion().await.unwrap();
    let outcome = coordinator.apply(completion).unwrap().unwrap();
    assert_eq!(outcome.items.len(), 3);
    assert!(outcome.is_end_of_stream);
}

#[tokio::test]
async fn test_restart_refetches_unchanged_params() {
    let source = GatedSource::new();
    let (mut coordinator, _calls) = coordinator(&source);
    let params = QueryParams {
        is_active: true,
        page_index: 0,
        page_size: 10,
        filters: FilterSet::default(),
    };

    let first = coordinator.reconcile(&params).unwrap();
    assert!(coordinator.reconcile(&params).is_none());

    coordinator.restart();
    assert!(!coordinator.is_in_flight());
    let second = coordinator.reconcile(&params).unwrap();
    assert!(second > first);
    source.wait_for_calls(2).await;

    // The fetch issued before the restart no longer applies
    source.resolve(0, page(0..11));
    let completion = coordinator.next_completion().await.unwrap();
    assert_eq!(completion.seq, first);
    assert!(coordinator.apply(completion).unwrap().is_none());
}
