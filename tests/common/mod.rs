#![allow(dead_code)]

use async_trait::async_trait;
use lazyselect::query::VecQuerySource;
use lazyselect::{PageRequest, QueryError, QueryResult, QuerySource, SelectItem};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub type PageResult = Result<QueryResult<Person, usize>, QueryError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: usize,
    pub name: String,
    pub disabled: bool,
}

impl SelectItem for Person {
    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

pub fn person(id: usize) -> Person {
    Person {
        id,
        name: format!("Person {}", id),
        disabled: false,
    }
}

pub fn people(ids: std::ops::Range<usize>) -> Vec<Person> {
    ids.map(person).collect()
}

/// Successful page holding `ids`, continuing at the end of the range
pub fn page(ids: std::ops::Range<usize>) -> PageResult {
    let next = ids.end;
    Ok(QueryResult::new(people(ids), Some(next)))
}

/// Serves a fixed list and remembers every request it saw
pub struct RecordingSource {
    inner: VecQuerySource<Person>,
    requests: Mutex<Vec<PageRequest<Person, usize>>>,
}

impl RecordingSource {
    pub fn new(items: Vec<Person>) -> Arc<Self> {
        Arc::new(Self {
            inner: VecQuerySource::new(items),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<PageRequest<Person, usize>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> PageRequest<Person, usize> {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl QuerySource<Person, usize> for RecordingSource {
    async fn fetch_page(&self, request: PageRequest<Person, usize>) -> PageResult {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.fetch_page(request).await
    }
}

/// Every fetch waits until the test resolves it, so resolution order is under
/// the test's control
#[derive(Default)]
pub struct GatedSource {
    requests: Mutex<Vec<PageRequest<Person, usize>>>,
    gates: Mutex<Vec<Option<oneshot::Sender<PageResult>>>>,
}

impl GatedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, call: usize) -> PageRequest<Person, usize> {
        self.requests.lock().unwrap()[call].clone()
    }

    /// Resolve the `call`-th fetch (zero-based, in issue order)
    pub fn resolve(&self, call: usize, result: PageResult) {
        let gate = self.gates.lock().unwrap()[call].take().expect("fetch already resolved");
        let _ = gate.send(result);
    }

    /// Let spawned fetch tasks run until `count` fetches reached the source
    pub async fn wait_for_calls(&self, count: usize) {
        for _ in 0..1000 {
            if self.call_count() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} fetches, saw {}", count, self.call_count());
    }
}

#[async_trait]
impl QuerySource<Person, usize> for GatedSource {
    async fn fetch_page(&self, request: PageRequest<Person, usize>) -> PageResult {
        let (tx, rx) = oneshot::channel();
        {
            self.requests.lock().unwrap().push(request);
            self.gates.lock().unwrap().push(Some(tx));
        }
        rx.await
            .unwrap_or_else(|_| Err(QueryError::Rejected("gate dropped".to_string())))
    }
}

pub fn dyn_source<S>(source: &Arc<S>) -> Option<Arc<dyn QuerySource<Person, usize>>>
where
    S: QuerySource<Person, usize> + 'static,
{
    Some(source.clone() as Arc<dyn QuerySource<Person, usize>>)
}
