//! Terminal adapter for the selection controls.
//!
//! The controls themselves are rendering-agnostic. This module maps crossterm
//! input onto them and draws their state with ratatui; drawing is a pure
//! function of status, items, end-of-stream flag and selection.
//!
//! - [`actions`] - results of input handling
//! - [`view`] - row building and rendering

pub mod actions;
pub mod view;

pub use actions::SelectAction;

use crossterm::event::{Event, KeyEvent};
use ratatui::{layout::Rect, Frame};

pub trait Component {
    fn handle_events(&mut self, event: Option<Event>) -> SelectAction {
        if let Some(Event::Key(key)) = event {
            self.handle_key_events(key)
        } else {
            SelectAction::None
        }
    }

    fn handle_key_events(&mut self, key: KeyEvent) -> SelectAction;

    fn render(&mut self, f: &mut Frame, rect: Rect);

    // Optional lifecycle methods
    fn on_focus(&mut self) {}
    fn on_blur(&mut self) {}
}
