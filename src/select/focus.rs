//! Keyboard focus movement over a list of options.
//!
//! Disabled and presentation-only options are skipped; movement never wraps.

use super::SelectItem;

/// Where keyboard focus currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The control that opens the list
    #[default]
    Trigger,
    /// An option, by index into the loaded items
    Item(usize),
}

impl Focus {
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Focus::Item(index) => Some(*index),
            Focus::Trigger => None,
        }
    }
}

pub fn is_focusable<I: SelectItem>(item: &I) -> bool {
    !item.is_disabled() && !item.is_presentation()
}

pub fn first_focusable<I: SelectItem>(items: &[I]) -> Option<usize> {
    items.iter().position(is_focusable)
}

pub fn last_focusable<I: SelectItem>(items: &[I]) -> Option<usize> {
    items.iter().rposition(is_focusable)
}

/// First focusable option after `from`
pub fn next_focusable<I: SelectItem>(items: &[I], from: usize) -> Option<usize> {
    items
        .iter()
        .enumerate()
        .skip(from + 1)
        .find(|(_, item)| is_focusable(*item))
        .map(|(index, _)| index)
}

/// Last focusable option before `from`
pub fn previous_focusable<I: SelectItem>(items: &[I], from: usize) -> Option<usize> {
    items
        .iter()
        .take(from.min(items.len()))
        .rposition(is_focusable)
}

/// Move `step` options forward or backward, clamped to the focusable range.
/// Landing on an unfocusable option continues in the direction of travel.
pub fn jump<I: SelectItem>(items: &[I], from: usize, step: usize, forward: bool) -> Option<usize> {
    let first = first_focusable(items)?;
    let last = last_focusable(items)?;

    let target = if forward {
        from.saturating_add(step).clamp(first, last)
    } else {
        from.saturating_sub(step).clamp(first, last)
    };

    if is_focusable(&items[target]) {
        Some(target)
    } else if forward {
        next_focusable(items, target)
    } else {
        previous_focusable(items, target)
    }
}

/// Option to focus when the list opens: the selected one if it can take
/// focus, otherwise the first focusable option.
pub fn initial_focus<I: SelectItem>(items: &[I], selected: Option<&I>) -> Option<usize> {
    selected
        .and_then(|selected| items.iter().position(|item| item.key() == selected.key()))
        .filter(|&index| is_focusable(&items[index]))
        .or_else(|| first_focusable(items))
}
