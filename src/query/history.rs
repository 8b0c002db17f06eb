//! Per-session record of fetched pages.
//!
//! For every page already fetched the store remembers the page's last item and
//! the continuation token the source returned with it, so the next page can be
//! requested from the right position. Keys always form the contiguous range
//! `0..=N`.

use std::collections::BTreeMap;

use super::PageIndex;

/// Violations of the page history's contiguity invariant.
///
/// These indicate a bookkeeping bug in the caller, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("page history is out of sync: pushed page {pushed} but the next expected page is {expected}")]
    NonContiguous { pushed: PageIndex, expected: PageIndex },
}

/// What is remembered about one fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHistoryItem<I, C> {
    pub last_item: Option<I>,
    pub continuation: Option<C>,
}

impl<I, C> PageHistoryItem<I, C> {
    pub fn new(last_item: Option<I>, continuation: Option<C>) -> Self {
        Self { last_item, continuation }
    }
}

#[derive(Debug, Clone)]
pub struct PageHistoryStore<I, C> {
    pages: BTreeMap<PageIndex, PageHistoryItem<I, C>>,
}

impl<I, C> Default for PageHistoryStore<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, C> PageHistoryStore<I, C> {
    pub fn new() -> Self {
        Self { pages: BTreeMap::new() }
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Record `item` for `page_index`, which must directly follow the highest
    /// recorded page (or be 0 on an empty store).
    pub fn push(&mut self, page_index: PageIndex, item: PageHistoryItem<I, C>) -> Result<(), HistoryError> {
        let expected = self.last_index().map_or(0, |last| last + 1);
        if page_index != expected {
            return Err(HistoryError::NonContiguous {
                pushed: page_index,
                expected,
            });
        }

        self.pages.insert(page_index, item);
        Ok(())
    }

    /// Drop every entry above `page_index`.
    pub fn truncate_to(&mut self, page_index: PageIndex) {
        match self.last_index() {
            // last > page_index, so page_index + 1 cannot overflow
            Some(last) if last > page_index => {
                // split_off keeps keys <= page_index in self
                let _ = self.pages.split_off(&(page_index + 1));
            }
            _ => {}
        }
    }

    pub fn peek(&self, page_index: PageIndex) -> Option<&PageHistoryItem<I, C>> {
        self.pages.get(&page_index)
    }

    pub fn last_index(&self) -> Option<PageIndex> {
        self.pages.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
