//! Rendering of a [`LazySelect`] with ratatui.

use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::BorderType, Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
    Frame,
};

use super::{Component, SelectAction};
use crate::constants::{LABEL_EMPTY, LABEL_END_OF_STREAM, LABEL_ERROR_PREFIX, LABEL_LOADING};
use crate::query::QueryStatus;
use crate::select::focus::{self, Focus};
use crate::select::{LazySelect, MultiAssigner, SelectItem};

/// Height of the bordered trigger line
const TRIGGER_HEIGHT: u16 = 3;

/// Kind of row in the open list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Item { label: String, focusable: bool },
    Loading,
    EndOfStream,
    Empty,
    Error(String),
}

impl Row {
    pub fn text(&self) -> String {
        match self {
            Row::Item { label, .. } => label.clone(),
            Row::Loading => LABEL_LOADING.to_string(),
            Row::EndOfStream => LABEL_END_OF_STREAM.to_string(),
            Row::Empty => LABEL_EMPTY.to_string(),
            Row::Error(message) => format!("{}: {}", LABEL_ERROR_PREFIX, message),
        }
    }
}

/// Rows of the open list: the loaded items followed by at most one status row.
pub fn list_rows<I: SelectItem>(items: &[I], status: &QueryStatus, is_end_of_stream: bool) -> Vec<Row> {
    let mut rows: Vec<Row> = items
        .iter()
        .map(|item| Row::Item {
            label: item.label(),
            focusable: focus::is_focusable(item),
        })
        .collect();

    match status {
        QueryStatus::Loading => rows.push(Row::Loading),
        QueryStatus::Error { message } => rows.push(Row::Error(message.clone())),
        QueryStatus::Ready if items.is_empty() => rows.push(Row::Empty),
        QueryStatus::Ready if is_end_of_stream => rows.push(Row::EndOfStream),
        _ => {}
    }

    rows
}

/// Draw the trigger and, when open, the option list below it.
pub fn render_select<I, C>(f: &mut Frame, rect: Rect, select: &LazySelect<I, C>)
where
    I: SelectItem,
    C: Clone + Send + Sync + 'static,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TRIGGER_HEIGHT), Constraint::Min(0)])
        .split(rect);

    let trigger_style = if select.is_disabled() {
        Style::default().fg(Color::DarkGray)
    } else if select.focus() == Focus::Trigger {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let arrow = if select.is_open() { "▴" } else { "▾" };
    let trigger = Paragraph::new(Line::from(vec![
        Span::raw(select.display_value()),
        Span::raw(" "),
        Span::styled(arrow, Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(trigger_style),
    );
    f.render_widget(trigger, chunks[0]);

    if !select.is_open() || chunks[1].height == 0 {
        return;
    }

    let session = select.session();
    let rows = list_rows(select.items(), &session.status, session.is_end_of_stream);
    let total = rows.len();

    let list_items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let style = match row {
                Row::Item { focusable: true, .. } => Style::default(),
                Row::Item { focusable: false, .. } => Style::default().fg(Color::DarkGray),
                Row::Error(_) => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            };
            ListItem::new(Line::from(Span::styled(row.text(), style)))
        })
        .collect();

    let (list_area, scrollbar_area) = split_scrollbar(chunks[1], total);

    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    let focused = select.focus().item_index();
    let mut list_state = ListState::default();
    list_state.select(focused);
    f.render_stateful_widget(list, list_area, &mut list_state);

    if let Some(area) = scrollbar_area {
        let mut state = ScrollbarState::new(total).position(focused.unwrap_or(0));
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .style(Style::default().fg(Color::DarkGray));
        f.render_stateful_widget(scrollbar, area, &mut state);
    }
}

/// Split off a one-column scrollbar when the rows overflow the bordered area.
pub fn split_scrollbar(rect: Rect, total_rows: usize) -> (Rect, Option<Rect>) {
    let available_height = rect.height.saturating_sub(2) as usize;
    if total_rows <= available_height {
        return (rect, None);
    }

    let content = Rect {
        width: rect.width.saturating_sub(1),
        ..rect
    };
    let scrollbar = Rect {
        x: rect.x + rect.width.saturating_sub(1),
        y: rect.y + 1,
        width: 1,
        height: rect.height.saturating_sub(2),
    };
    (content, Some(scrollbar))
}

impl<I, C> Component for LazySelect<I, C>
where
    I: SelectItem,
    C: Clone + Send + Sync + 'static,
{
    fn handle_key_events(&mut self, key: KeyEvent) -> SelectAction {
        self.handle_key(key)
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        render_select(f, rect, self);
    }

    /// Focus leaving the control (outside click) closes the list
    fn on_blur(&mut self) {
        self.close();
    }
}

impl<I, C> Component for MultiAssigner<I, C>
where
    I: SelectItem,
    C: Clone + Send + Sync + 'static,
{
    fn handle_key_events(&mut self, key: KeyEvent) -> SelectAction {
        self.handle_key(key)
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        render_select(f, rect, self.select());
    }

    fn on_blur(&mut self) {
        self.select_mut().close();
    }
}
