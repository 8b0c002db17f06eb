//! Query layer for lazily paginated option lists.
//!
//! This module defines the boundary between the selection control and the host
//! application's data source: the filter model, the page request handed to the
//! source, the page it returns, and the status reported back to the renderer.
//!
//! Pagination works with an overflow probe: the source is always asked for
//! `page_size + 1` items, and receiving no more than `page_size` of them means
//! there is no further page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;

use crate::constants::DEFAULT_PAGE_SIZE;

pub mod coordinator;
pub mod history;
pub mod memory;

pub use coordinator::{FetchCompletion, PageOutcome, QueryCoordinator, QueryParams, ResultHandler};
pub use history::{HistoryError, PageHistoryItem, PageHistoryStore};
pub use memory::VecQuerySource;

/// Zero-based page position
pub type PageIndex = usize;

/// Errors a query source can report.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Query was rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    NotEquals,
    /// Case-insensitive substring for strings, membership for arrays
    Contains,
    /// Case-insensitive prefix
    StartsWith,
    /// Field value is one of the values in the filter's array
    In,
}

/// A single predicate on one field of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name; dots descend into nested objects (`owner.name`)
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Equals, value)
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Contains, value)
    }

    /// Evaluate this predicate against the JSON form of an item.
    ///
    /// A missing field only satisfies `NotEquals`.
    pub fn matches(&self, item: &Value) -> bool {
        let field = self
            .field
            .split('.')
            .try_fold(item, |current, key| current.get(key));

        let Some(field) = field else {
            return self.op == FilterOp::NotEquals;
        };

        match self.op {
            FilterOp::Equals => field == &self.value,
            FilterOp::NotEquals => field != &self.value,
            FilterOp::Contains => match (field, &self.value) {
                (Value::String(haystack), Value::String(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                (Value::Array(values), needle) => values.contains(needle),
                _ => false,
            },
            FilterOp::StartsWith => match (field, &self.value) {
                (Value::String(haystack), Value::String(prefix)) => {
                    haystack.to_lowercase().starts_with(&prefix.to_lowercase())
                }
                _ => false,
            },
            FilterOp::In => match &self.value {
                Value::Array(candidates) => candidates.contains(field),
                _ => false,
            },
        }
    }
}

/// Ordered conjunction of filters. Replaced wholesale whenever the user edits
/// the query; compared by deep equality to decide whether pagination restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self(filters)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    /// Copy of this set with `filter` appended
    pub fn with(&self, filter: Filter) -> Self {
        let mut filters = self.0.clone();
        filters.push(filter);
        Self(filters)
    }

    /// Copy of this set without the filter at `index`
    pub fn without(&self, index: usize) -> Self {
        let mut filters = self.0.clone();
        if index < filters.len() {
            filters.remove(index);
        }
        Self(filters)
    }

    /// True when every filter matches
    pub fn matches(&self, item: &Value) -> bool {
        self.0.iter().all(|filter| filter.matches(item))
    }
}

impl From<Vec<Filter>> for FilterSet {
    fn from(filters: Vec<Filter>) -> Self {
        Self(filters)
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Everything a source needs to produce one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest<I, C> {
    /// Last item of the previous page, `None` for page 0
    pub previous_item: Option<I>,
    /// Continuation token returned with the previous page
    pub previous_continuation: Option<C>,
    pub page_index: PageIndex,
    pub page_size: usize,
    /// Always `page_size + 1`; the extra item is the end-of-stream probe
    pub limit: usize,
    pub filters: FilterSet,
}

/// One page as returned by a source, before trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<I, C> {
    pub items: Vec<I>,
    pub continuation: Option<C>,
}

impl<I, C> QueryResult<I, C> {
    pub fn new(items: Vec<I>, continuation: Option<C>) -> Self {
        Self { items, continuation }
    }
}

/// Status of the session's most recent query, as seen by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryStatus {
    /// No query issued since the session was (re)armed
    #[default]
    Idle,
    /// A query is in flight
    Loading,
    /// The last query succeeded
    Ready,
    /// The last query failed
    Error {
        /// Human-readable error message describing what went wrong
        message: String,
    },
}

impl QueryStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, QueryStatus::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Data source supplying pages of items.
///
/// `I` is the caller's item type and `C` the opaque continuation token the
/// source needs to resume after the previous page's last item.
#[async_trait]
pub trait QuerySource<I, C>: Send + Sync {
    async fn fetch_page(&self, request: PageRequest<I, C>) -> Result<QueryResult<I, C>, QueryError>;
}

/// Adapts an async closure into a [`QuerySource`].
pub struct FnQuerySource<F, I, C> {
    func: F,
    _marker: PhantomData<fn() -> (I, C)>,
}

impl<F, I, C> FnQuerySource<F, I, C> {
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, I, C> QuerySource<I, C> for FnQuerySource<F, I, C>
where
    F: Fn(PageRequest<I, C>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<QueryResult<I, C>, QueryError>> + Send + 'static,
    I: Send + 'static,
    C: Send + 'static,
{
    async fn fetch_page(&self, request: PageRequest<I, C>) -> Result<QueryResult<I, C>, QueryError> {
        (self.func)(request).await
    }
}

/// Page size to use for a caller-supplied value: anything absent or not
/// positive falls back to [`DEFAULT_PAGE_SIZE`].
pub fn normalize_page_size(requested: Option<i64>) -> usize {
    match requested {
        Some(size) if size > 0 => size as usize,
        _ => DEFAULT_PAGE_SIZE,
    }
}
