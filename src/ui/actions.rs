/// Result of feeding an input event to a selection control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectAction {
    #[default]
    None,
    Opened,
    Closed,
    FocusMoved(usize),  // Index into the loaded items
    Selected(usize),    // Index of the chosen item
    PageRequested(u64), // Sequence number of the issued fetch
}

impl SelectAction {
    pub fn is_none(&self) -> bool {
        matches!(self, SelectAction::None)
    }
}
