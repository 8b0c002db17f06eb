//! Issues page fetches and reconciles their results.
//!
//! Every fetch gets a sequence number from a monotonically increasing counter
//! and runs on its own tokio task; its result comes back over a channel as a
//! [`FetchCompletion`]. Only the completion carrying the most recently issued
//! sequence number is applied. Older fetches are never aborted, their results
//! are simply dropped when they arrive.

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::history::{HistoryError, PageHistoryItem, PageHistoryStore};
use super::{FilterSet, PageIndex, PageRequest, QueryError, QueryResult, QuerySource, QueryStatus};

/// Called with `(status, items, is_end_of_stream)` once per applied resolution.
pub type ResultHandler<I> = Box<dyn FnMut(&QueryStatus, &[I], bool) + Send>;

/// Inputs whose change re-triggers a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub is_active: bool,
    pub page_index: PageIndex,
    pub page_size: usize,
    pub filters: FilterSet,
}

/// A resolved fetch travelling back to the coordinator.
#[derive(Debug)]
pub struct FetchCompletion<I, C> {
    pub seq: u64,
    pub page_index: PageIndex,
    pub page_size: usize,
    pub result: Result<QueryResult<I, C>, QueryError>,
}

/// The applied result of the current fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome<I> {
    pub seq: u64,
    pub page_index: PageIndex,
    pub status: QueryStatus,
    /// Trimmed to the page size; empty on error
    pub items: Vec<I>,
    pub is_end_of_stream: bool,
    /// Set when an empty page beyond the first one ended the stream
    pub forced_end_of_stream: bool,
}

pub struct QueryCoordinator<I, C> {
    source: Option<Arc<dyn QuerySource<I, C>>>,
    history: PageHistoryStore<I, C>,
    next_seq: u64,
    current: Option<u64>,
    last_params: Option<QueryParams>,
    on_result: Option<ResultHandler<I>>,
    completion_tx: mpsc::UnboundedSender<FetchCompletion<I, C>>,
    completion_rx: mpsc::UnboundedReceiver<FetchCompletion<I, C>>,
}

impl<I, C> QueryCoordinator<I, C>
where
    I: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    pub fn new(source: Option<Arc<dyn QuerySource<I, C>>>) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Self {
            source,
            history: PageHistoryStore::new(),
            next_seq: 1,
            current: None,
            last_params: None,
            on_result: None,
            completion_tx,
            completion_rx,
        }
    }

    pub fn with_result_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&QueryStatus, &[I], bool) + Send + 'static,
    {
        self.on_result = Some(Box::new(handler));
        self
    }

    pub fn set_result_handler(&mut self, handler: Option<ResultHandler<I>>) {
        self.on_result = handler;
    }

    /// Swap the data source. Anything in flight is invalidated and the next
    /// [`reconcile`](Self::reconcile) fetches again.
    pub fn set_source(&mut self, source: Option<Arc<dyn QuerySource<I, C>>>) {
        self.source = source;
        self.restart();
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn history(&self) -> &PageHistoryStore<I, C> {
        &self.history
    }

    /// Sequence number of the fetch whose result would currently be applied
    pub fn current_seq(&self) -> Option<u64> {
        self.current
    }

    pub fn is_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// Soft-cancel whatever is in flight: its result will be discarded.
    pub fn invalidate(&mut self) {
        if let Some(seq) = self.current.take() {
            debug!("Invalidated in-flight fetch #{}", seq);
        }
    }

    /// Forget in-flight work, history and the last parameters, so the next
    /// [`reconcile`](Self::reconcile) fetches page 0 even for unchanged params.
    pub fn restart(&mut self) {
        self.invalidate();
        self.history.clear();
        self.last_params = None;
    }

    /// Apply the re-trigger policy for a new set of parameters.
    ///
    /// Page size or filter changes and deactivation clear the page history.
    /// A fetch is issued only when the parameters changed, the session is
    /// active and a source is set. Returns the issued sequence number.
    pub fn reconcile(&mut self, params: &QueryParams) -> Option<u64> {
        let previous = self.last_params.replace(params.clone());
        if previous.as_ref() == Some(params) {
            return None;
        }

        if let Some(previous) = &previous {
            if previous.page_size != params.page_size || previous.filters != params.filters {
                debug!("Pagination restarted: page size or filters changed");
                self.history.clear();
            }
        }

        if !params.is_active {
            self.invalidate();
            self.history.clear();
            return None;
        }

        self.fetch_page(params.page_index, params.page_size, &params.filters)
    }

    /// Issue a fetch for `page_index`, resuming after the recorded end of the
    /// previous page. Returns `None` when no source is set.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_page(&mut self, page_index: PageIndex, page_size: usize, filters: &FilterSet) -> Option<u64> {
        let source = self.source.clone()?;

        let (previous_item, previous_continuation) = if page_index == 0 {
            self.history.clear();
            (None, None)
        } else {
            self.history.truncate_to(page_index - 1);
            match self.history.peek(page_index - 1) {
                Some(entry) => (entry.last_item.clone(), entry.continuation.clone()),
                None => {
                    warn!("No history for page {} while fetching page {}", page_index - 1, page_index);
                    (None, None)
                }
            }
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.current = Some(seq);

        let request = PageRequest {
            previous_item,
            previous_continuation,
            page_index,
            page_size,
            limit: page_size.saturating_add(1),
            filters: filters.clone(),
        };

        debug!("Issuing fetch #{} for page {} (limit {})", seq, page_index, request.limit);

        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(request).await;
            let _ = completion_tx.send(FetchCompletion {
                seq,
                page_index,
                page_size,
                result,
            });
        });

        Some(seq)
    }

    /// Wait for the next resolved fetch, current or not.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion<I, C>> {
        self.completion_rx.recv().await
    }

    /// Resolved fetch if one is ready, without waiting.
    pub fn try_next_completion(&mut self) -> Option<FetchCompletion<I, C>> {
        self.completion_rx.try_recv().ok()
    }

    /// Apply a resolved fetch if it is still the most recently issued one.
    ///
    /// Superseded completions yield `Ok(None)`. A history contiguity violation
    /// is returned as an error; it means page indices drifted out of lockstep.
    pub fn apply(&mut self, completion: FetchCompletion<I, C>) -> Result<Option<PageOutcome<I>>, HistoryError> {
        let FetchCompletion {
            seq,
            page_index,
            page_size,
            result,
        } = completion;

        if self.current != Some(seq) {
            debug!("Discarding superseded fetch #{} for page {}", seq, page_index);
            return Ok(None);
        }
        self.current = None;

        let outcome = match result {
            Ok(QueryResult {
                mut items,
                continuation,
            }) => {
                let returned = items.len();
                let forced_end_of_stream = returned == 0 && page_index > 0;
                if forced_end_of_stream {
                    warn!("Fetch #{} returned no items for page {}; ending the stream", seq, page_index);
                }

                let is_end_of_stream = forced_end_of_stream || returned <= page_size;
                items.truncate(page_size);

                if !is_end_of_stream {
                    let last_item = items.last().cloned();
                    self.history
                        .push(page_index, PageHistoryItem::new(last_item, continuation))?;
                }

                info!(
                    "Fetch #{} applied: page {}, {} items, end of stream: {}",
                    seq,
                    page_index,
                    items.len(),
                    is_end_of_stream
                );

                PageOutcome {
                    seq,
                    page_index,
                    status: QueryStatus::Ready,
                    items,
                    is_end_of_stream,
                    forced_end_of_stream,
                }
            }
            Err(e) => {
                error!("Fetch #{} for page {} failed: {}", seq, page_index, e);
                PageOutcome {
                    seq,
                    page_index,
                    status: QueryStatus::Error { message: e.to_string() },
                    items: Vec::new(),
                    is_end_of_stream: false,
                    forced_end_of_stream: false,
                }
            }
        };

        if let Some(handler) = self.on_result.as_mut() {
            handler(&outcome.status, &outcome.items, outcome.is_end_of_stream);
        }

        Ok(Some(outcome))
    }
}
