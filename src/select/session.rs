//! Open/closed session state of a selection control.
//!
//! Transitions build a new [`SessionState`] instead of patching fields, so each
//! reset (on close, on filter change) is a single constructor call.

use crate::query::{FilterSet, PageIndex, QueryParams, QueryStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub is_open: bool,
    pub page_index: PageIndex,
    pub is_end_of_stream: bool,
    pub filter_buffer: FilterSet,
    pub status: QueryStatus,
}

impl SessionState {
    /// Armed, closed session showing the externally supplied filters
    pub fn closed(filters: FilterSet) -> Self {
        Self {
            is_open: false,
            page_index: 0,
            is_end_of_stream: false,
            filter_buffer: filters,
            status: QueryStatus::Idle,
        }
    }

    /// Open session on the first page with nothing loaded yet
    pub fn opened(filters: FilterSet) -> Self {
        Self {
            is_open: true,
            ..Self::closed(filters)
        }
    }

    /// Same open session restarted from page 0 with new filters
    pub fn restarted(&self, filters: FilterSet) -> Self {
        Self {
            is_open: self.is_open,
            ..Self::closed(filters)
        }
    }

    /// Scrolling may fetch another page only when open, idle and not at the end
    pub fn can_advance(&self) -> bool {
        self.is_open && !self.status.is_loading() && !self.is_end_of_stream
    }

    /// Scrolled on to the next page
    pub fn advanced(&self) -> Self {
        Self {
            page_index: self.page_index + 1,
            ..self.clone()
        }
    }

    /// A fetch for the current page is in flight
    pub fn loading(&self) -> Self {
        Self {
            status: QueryStatus::Loading,
            ..self.clone()
        }
    }

    /// The current fetch resolved
    pub fn resolved(&self, status: QueryStatus, is_end_of_stream: bool) -> Self {
        Self {
            status,
            is_end_of_stream,
            ..self.clone()
        }
    }

    pub fn query_params(&self, page_size: usize) -> QueryParams {
        QueryParams {
            is_active: self.is_open,
            page_index: self.page_index,
            page_size,
            filters: self.filter_buffer.clone(),
        }
    }
}
