//! Types shared by the input loop, the session driver and the renderer.

use colander_core::selection::{Direction, Selection};

/// One dispatched user intention, decoupled from raw terminal events so the
/// keymap can be tested without a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Cancel,
    Finalize,
    Rerun,
    CycleMode,
    ToggleCase,
    Move(Direction),
    SwitchAxis,
    ToggleFocused,
    /// Toggle the Nth visible column, 1-based (Alt-1..9).
    ToggleColumnNumber(usize),
    SelectAllFocused,
    ClearFocused,
    QueryChar(char),
    QueryBackspace,
    /// Left mouse click at terminal coordinates.
    Click { column: u16, row: u16 },
    Resize { width: u16, height: u16 },
}

/// How an interactive session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Finalized(Selection),
    Cancelled,
    /// Alt-R: restart the session with the current result as fresh input.
    Rerun(Selection),
}

/// The visible window over the filtered rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportState {
    pub offset: usize,
    pub width: u16,
    pub height: u16,
}

impl ViewportState {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            offset: 0,
            width,
            height,
        }
    }

    /// Rows available for data once the query line, the column header and
    /// the status line are accounted for.
    #[must_use]
    pub fn data_rows(&self) -> usize {
        self.height.saturating_sub(3) as usize
    }
}
