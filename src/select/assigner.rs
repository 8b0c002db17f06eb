//! Multi-choice assignment on top of [`LazySelect`].
//!
//! Choosing an option toggles its membership in the assigned list and keeps the
//! list open, so several options can be assigned in one session.

use crossterm::event::KeyEvent;
use log::debug;
use std::sync::Arc;

use super::focus;
use super::lazy_select::LazySelect;
use super::SelectItem;
use crate::config::SelectConfig;
use crate::query::QuerySource;
use crate::ui::actions::SelectAction;

pub type AssignmentHandler<I> = Box<dyn FnMut(&[I]) + Send>;

pub struct MultiAssigner<I: SelectItem, C> {
    select: LazySelect<I, C>,
    assigned: Vec<I>,
    on_change: Option<AssignmentHandler<I>>,
}

impl<I, C> MultiAssigner<I, C>
where
    I: SelectItem,
    C: Clone + Send + Sync + 'static,
{
    pub fn new(source: Option<Arc<dyn QuerySource<I, C>>>, config: &SelectConfig) -> Self {
        Self {
            select: LazySelect::new(source, config).with_close_on_select(false),
            assigned: Vec::new(),
            on_change: None,
        }
    }

    pub fn with_assigned(mut self, assigned: Vec<I>) -> Self {
        self.assigned = assigned;
        self
    }

    pub fn with_on_change<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&[I]) + Send + 'static,
    {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn select(&self) -> &LazySelect<I, C> {
        &self.select
    }

    pub fn select_mut(&mut self) -> &mut LazySelect<I, C> {
        &mut self.select
    }

    pub fn assigned(&self) -> &[I] {
        &self.assigned
    }

    pub fn is_assigned(&self, item: &I) -> bool {
        let key = item.key();
        self.assigned.iter().any(|assigned| assigned.key() == key)
    }

    /// Add `item` unless it is already assigned or cannot be chosen
    pub fn assign(&mut self, item: I) -> bool {
        if self.is_assigned(&item) || !focus::is_focusable(&item) {
            return false;
        }
        debug!("Assigned '{}'", item.key());
        self.assigned.push(item);
        self.notify();
        true
    }

    pub fn unassign(&mut self, key: &str) -> bool {
        let before = self.assigned.len();
        self.assigned.retain(|item| item.key() != key);
        if self.assigned.len() == before {
            return false;
        }
        debug!("Unassigned '{}'", key);
        self.notify();
        true
    }

    pub fn clear(&mut self) {
        if !self.assigned.is_empty() {
            self.assigned.clear();
            self.notify();
        }
    }

    /// Choose the loaded option at `index`; returns whether it is now assigned
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let item = self.select.select(index)?;
        Some(self.toggle_item(item))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SelectAction {
        let action = self.select.handle_key(key);
        if let SelectAction::Selected(_) = action {
            if let Some(item) = self.select.selected().cloned() {
                self.toggle_item(item);
            }
        }
        action
    }

    fn toggle_item(&mut self, item: I) -> bool {
        if self.is_assigned(&item) {
            self.unassign(&item.key());
            false
        } else {
            self.assign(item)
        }
    }

    fn notify(&mut self) {
        if let Some(handler) = self.on_change.as_mut() {
            handler(&self.assigned);
        }
    }
}
