//! Lazily paginated single-choice select.
//!
//! [`LazySelect`] wires the session state, the query coordinator and the focus
//! helpers together. It never renders anything itself; the render adapter in
//! [`crate::ui`] reads its state through the accessors.
//!
//! Fetch results arrive asynchronously. Hosts drive them in by calling
//! [`LazySelect::pump`] from their event loop, or by awaiting
//! [`LazySelect::settle`].

use crossterm::event::{KeyCode, KeyEvent};
use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use super::focus::{self, Focus};
use super::session::SessionState;
use super::SelectItem;
use crate::config::SelectConfig;
use crate::constants::{PLACEHOLDER_NO_SELECTION, UNKNOWN_SELECTION_PLACEHOLDER};
use crate::query::{
    normalize_page_size, FetchCompletion, FilterSet, HistoryError, PageHistoryStore, PageOutcome,
    QueryCoordinator, QuerySource, QueryStatus,
};
use crate::ui::actions::SelectAction;

pub type SelectHandler<I> = Box<dyn FnMut(&I) + Send>;
pub type FiltersHandler = Box<dyn FnMut(&FilterSet) + Send>;

pub struct LazySelect<I: SelectItem, C> {
    session: SessionState,
    session_id: Option<Uuid>,
    items: Vec<I>,
    selected: Option<I>,
    value: Option<String>,
    external_filters: FilterSet,
    page_size: usize,
    scroll_threshold: usize,
    page_jump: usize,
    close_on_select: bool,
    disabled: bool,
    focus: Focus,
    /// Trigger key whose focus target waits for the first loaded page
    pending_focus: Option<KeyCode>,
    coordinator: QueryCoordinator<I, C>,
    on_select: Option<SelectHandler<I>>,
    on_filters_change: Option<FiltersHandler>,
}

impl<I, C> LazySelect<I, C>
where
    I: SelectItem,
    C: Clone + Send + Sync + 'static,
{
    pub fn new(source: Option<Arc<dyn QuerySource<I, C>>>, config: &SelectConfig) -> Self {
        Self {
            session: SessionState::closed(FilterSet::default()),
            session_id: None,
            items: Vec::new(),
            selected: None,
            value: None,
            external_filters: FilterSet::default(),
            page_size: config.effective_page_size(),
            scroll_threshold: config.scroll_threshold,
            page_jump: config.page_jump.max(1),
            close_on_select: config.close_on_select,
            disabled: false,
            focus: Focus::Trigger,
            pending_focus: None,
            coordinator: QueryCoordinator::new(source),
            on_select: None,
            on_filters_change: None,
        }
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.set_external_filters(filters);
        self
    }

    pub fn with_on_select<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&I) + Send + 'static,
    {
        self.on_select = Some(Box::new(handler));
        self
    }

    pub fn with_on_filters_change<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&FilterSet) + Send + 'static,
    {
        self.on_filters_change = Some(Box::new(handler));
        self
    }

    pub fn with_result_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&QueryStatus, &[I], bool) + Send + 'static,
    {
        self.coordinator.set_result_handler(Some(Box::new(handler)));
        self
    }

    pub fn with_close_on_select(mut self, close_on_select: bool) -> Self {
        self.close_on_select = close_on_select;
        self
    }

    // Accessors

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn selected(&self) -> Option<&I> {
        self.selected.as_ref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn history(&self) -> &PageHistoryStore<I, C> {
        self.coordinator.history()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.close();
        }
    }

    pub fn set_source(&mut self, source: Option<Arc<dyn QuerySource<I, C>>>) {
        self.coordinator.set_source(source);
        if self.session.is_open {
            self.restart(self.session.filter_buffer.clone());
            self.sync();
        }
    }

    /// Controlled value, identified by item key
    pub fn set_value(&mut self, key: Option<String>) {
        self.value = key;
    }

    // Session lifecycle

    pub fn open(&mut self) -> SelectAction {
        if self.disabled || self.session.is_open {
            return SelectAction::None;
        }

        self.session = SessionState::opened(self.session.filter_buffer.clone());
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        info!("Select session {} opened", session_id);

        self.sync();
        SelectAction::Opened
    }

    /// Close the list and re-arm it for the next opening
    pub fn close(&mut self) -> SelectAction {
        if !self.session.is_open {
            return SelectAction::None;
        }

        if let Some(session_id) = self.session_id.take() {
            info!("Select session {} closed", session_id);
        }

        self.session = SessionState::closed(self.external_filters.clone());
        self.items.clear();
        self.focus = Focus::Trigger;
        self.pending_focus = None;
        self.sync();
        SelectAction::Closed
    }

    pub fn toggle(&mut self) -> SelectAction {
        if self.session.is_open {
            self.close()
        } else {
            self.open()
        }
    }

    /// Replace the filter buffer of the open session. Restarts pagination and
    /// reports the new filters to the host.
    pub fn set_filters(&mut self, filters: FilterSet) -> Option<u64> {
        if !self.session.is_open || self.session.filter_buffer == filters {
            return None;
        }

        debug!("Filters changed: {} active", filters.len());
        self.restart(filters.clone());

        if let Some(handler) = self.on_filters_change.as_mut() {
            handler(&filters);
        }

        self.sync()
    }

    /// Filters supplied by the host. They become the buffer on every close,
    /// and immediately when they differ from what an open session shows.
    pub fn set_external_filters(&mut self, filters: FilterSet) {
        if self.external_filters == filters {
            return;
        }
        self.external_filters = filters.clone();

        if self.session.is_open {
            self.restart(filters);
            self.sync();
        } else {
            self.session = SessionState::closed(filters);
        }
    }

    pub fn set_page_size(&mut self, requested: Option<i64>) {
        let page_size = normalize_page_size(requested);
        if page_size == self.page_size {
            return;
        }
        self.page_size = page_size;

        if self.session.is_open {
            self.restart(self.session.filter_buffer.clone());
            self.sync();
        }
    }

    /// Scroll reached the end of the list: fetch the following page. After a
    /// failed fetch the same page is requested again instead.
    pub fn request_next_page(&mut self) -> Option<u64> {
        if !self.session.is_open || self.session.status.is_loading() {
            return None;
        }

        if self.session.status.error().is_some() {
            let seq = self.coordinator.fetch_page(
                self.session.page_index,
                self.page_size,
                &self.session.filter_buffer,
            )?;
            debug!("Retrying page {} as fetch #{}", self.session.page_index, seq);
            self.session = self.session.loading();
            return Some(seq);
        }

        if !self.session.can_advance() {
            return None;
        }

        self.session = self.session.advanced();
        self.sync()
    }

    /// Choose the item at `index`. Reports it to the host exactly once and,
    /// unless configured otherwise, closes the list.
    pub fn select(&mut self, index: usize) -> Option<I> {
        if !self.session.is_open {
            return None;
        }

        let item = self.items.get(index).filter(|item| focus::is_focusable(*item))?.clone();
        debug!("Selected '{}'", item.key());

        self.value = Some(item.key());
        self.selected = Some(item.clone());

        if let Some(handler) = self.on_select.as_mut() {
            handler(&item);
        }

        if self.close_on_select {
            self.close();
        } else {
            self.focus = Focus::Item(index);
        }

        Some(item)
    }

    /// Label for the current value.
    ///
    /// A value whose key matches neither a loaded option nor the remembered
    /// selection is logged and shown as a placeholder.
    pub fn display_value(&self) -> String {
        let Some(key) = self.value.as_deref() else {
            return PLACEHOLDER_NO_SELECTION.to_string();
        };

        self.items
            .iter()
            .chain(self.selected.iter())
            .find(|item| item.key() == key)
            .map(|item| item.label())
            .unwrap_or_else(|| {
                error!("Selected value '{}' is not among the known options", key);
                UNKNOWN_SELECTION_PLACEHOLDER.to_string()
            })
    }

    // Query plumbing

    /// Back to page 0 with `filters`. The next sync always fetches, even when
    /// the resulting parameters equal the last ones issued.
    fn restart(&mut self, filters: FilterSet) {
        self.session = self.session.restarted(filters);
        self.items.clear();
        self.focus = Focus::Trigger;
        self.coordinator.restart();
    }

    /// Hand the current parameters to the coordinator's re-trigger policy
    fn sync(&mut self) -> Option<u64> {
        let params = self.session.query_params(self.page_size);
        let seq = self.coordinator.reconcile(&params)?;
        self.session = self.session.loading();
        Some(seq)
    }

    /// Apply a resolved fetch. Page 0 replaces the list, later pages append;
    /// failures leave the list untouched.
    pub fn handle_completion(
        &mut self,
        completion: FetchCompletion<I, C>,
    ) -> Result<Option<PageOutcome<I>>, HistoryError> {
        let Some(outcome) = self.coordinator.apply(completion)? else {
            return Ok(None);
        };

        if outcome.status.is_ready() {
            if outcome.page_index == 0 {
                self.items = outcome.items.clone();
            } else {
                self.items.extend(outcome.items.iter().cloned());
            }
            self.session = self
                .session
                .resolved(outcome.status.clone(), outcome.is_end_of_stream);
        } else {
            self.session = self
                .session
                .resolved(outcome.status.clone(), self.session.is_end_of_stream);
        }

        if self.focus == Focus::Trigger {
            if let Some(code) = self.pending_focus {
                if let Some(index) = self.trigger_target(code) {
                    self.move_focus(index);
                }
            }
        }

        Ok(Some(outcome))
    }

    /// Apply every fetch that has already resolved
    pub fn pump(&mut self) -> Result<Vec<PageOutcome<I>>, HistoryError> {
        let mut outcomes = Vec::new();
        while let Some(completion) = self.coordinator.try_next_completion() {
            if let Some(outcome) = self.handle_completion(completion)? {
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    /// Wait until the current fetch resolves and apply it. Superseded
    /// completions arriving first are discarded along the way.
    pub async fn settle(&mut self) -> Result<Option<PageOutcome<I>>, HistoryError> {
        while self.coordinator.is_in_flight() {
            let Some(completion) = self.coordinator.next_completion().await else {
                break;
            };
            if let Some(outcome) = self.handle_completion(completion)? {
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }

    /// Wait for the next resolved fetch without applying it
    pub async fn next_completion(&mut self) -> Option<FetchCompletion<I, C>> {
        self.coordinator.next_completion().await
    }

    // Keyboard

    pub fn handle_key(&mut self, key: KeyEvent) -> SelectAction {
        match self.focus {
            Focus::Trigger => self.handle_trigger_key(key),
            Focus::Item(index) => self.handle_option_key(index, key),
        }
    }

    fn handle_trigger_key(&mut self, key: KeyEvent) -> SelectAction {
        if self.disabled {
            return SelectAction::None;
        }

        match key.code {
            KeyCode::Esc if self.session.is_open => self.close(),
            KeyCode::Up | KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Home | KeyCode::End => {
                let opened = self.open() == SelectAction::Opened;

                match self.trigger_target(key.code) {
                    Some(index) => {
                        self.move_focus(index);
                        SelectAction::FocusMoved(index)
                    }
                    None => {
                        // Nothing loaded yet; resolve the target once options arrive
                        self.pending_focus = self.session.is_open.then_some(key.code);
                        if opened {
                            SelectAction::Opened
                        } else {
                            SelectAction::None
                        }
                    }
                }
            }
            _ => SelectAction::None,
        }
    }

    /// Option a trigger key moves focus to
    fn trigger_target(&self, code: KeyCode) -> Option<usize> {
        match code {
            KeyCode::Home => focus::first_focusable(&self.items),
            KeyCode::End => focus::last_focusable(&self.items),
            _ => focus::initial_focus(&self.items, self.selected.as_ref()),
        }
    }

    fn handle_option_key(&mut self, index: usize, key: KeyEvent) -> SelectAction {
        let target = match key.code {
            KeyCode::Up => focus::previous_focusable(&self.items, index),
            KeyCode::Down => match focus::next_focusable(&self.items, index) {
                Some(next) => Some(next),
                None => {
                    return self
                        .request_next_page()
                        .map_or(SelectAction::None, SelectAction::PageRequested)
                }
            },
            KeyCode::PageUp => focus::jump(&self.items, index, self.page_jump, false),
            KeyCode::PageDown => focus::jump(&self.items, index, self.page_jump, true),
            KeyCode::Home => focus::first_focusable(&self.items),
            KeyCode::End => focus::last_focusable(&self.items),
            KeyCode::Enter | KeyCode::Char(' ') => {
                return match self.select(index) {
                    Some(_) => SelectAction::Selected(index),
                    None => SelectAction::None,
                };
            }
            KeyCode::Esc | KeyCode::Tab => return self.close(),
            _ => None,
        };

        match target {
            Some(target) if target != index => {
                self.move_focus(target);
                SelectAction::FocusMoved(target)
            }
            _ => SelectAction::None,
        }
    }

    /// Focus an option and fetch more when it is close to the end of the list
    fn move_focus(&mut self, index: usize) {
        self.focus = Focus::Item(index);
        self.pending_focus = None;

        if index.saturating_add(self.scroll_threshold).saturating_add(1) >= self.items.len() {
            self.request_next_page();
        }
    }
}
