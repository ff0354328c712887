//! The interactive session: state, event dispatch and the blocking loop.
//!
//! Single-threaded and cooperative: one event is read, applied to the state,
//! and the frame redrawn before the next event is accepted. The terminal is
//! held through a guard that restores it on every exit path.

use std::collections::HashSet;
use std::io::{self, Write};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::execute;
use log::debug;

use colander_core::error::{Error, Result};
use colander_core::matcher::{CompiledQuery, Query};
use colander_core::selection::{Axis, Selection, SelectionState, VisibleSet};
use colander_core::tokenizer::Matrix;

use crate::session::types::{Action, ViewportState};
use crate::session::ui::FrameLayout;

pub mod input;
pub mod types;
pub mod ui;

pub use types::SessionOutcome;

/// Everything the renderer and the dispatcher need about one session.
pub struct SessionState {
    pub matrix: Matrix,
    pub query: Query,
    pub compiled: CompiledQuery,
    pub selection: SelectionState,
    pub visible: VisibleSet,
    pub viewport: ViewportState,
}

/// What applying one action means for the loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Continue { redraw: bool },
    Done(SessionOutcome),
}

impl SessionState {
    #[must_use]
    pub fn new(matrix: Matrix, query: Query, width: u16, height: u16) -> Self {
        let compiled = query.compile();
        let mut state = Self {
            matrix,
            query,
            compiled,
            selection: SelectionState::default(),
            visible: VisibleSet::default(),
            viewport: ViewportState::new(width, height),
        };
        state.refresh();
        state
    }

    /// Recompiles the query, recomputes the visible set and snaps focus and
    /// viewport back into it. Idempotent.
    pub fn refresh(&mut self) {
        self.compiled = self.query.compile();
        let restriction = self.column_restriction();
        self.visible = VisibleSet::recompute(&self.matrix, &self.compiled, &restriction);
        self.selection.clamp_focus(&self.visible);
        self.scroll_to_focus();
    }

    /// The columns that row matching is restricted to: the selected columns
    /// when any exist, otherwise the focused column while browsing columns.
    fn column_restriction(&self) -> HashSet<usize> {
        if !self.selection.selected_columns.is_empty() {
            return self.selection.selected_columns.clone();
        }
        if self.selection.focus.axis == Axis::Columns {
            return self
                .visible
                .columns
                .get(self.selection.focus.index)
                .map(|&column| HashSet::from([column]))
                .unwrap_or_default();
        }
        HashSet::new()
    }

    fn scroll_to_focus(&mut self) {
        let data_rows = self.viewport.data_rows();
        if data_rows == 0 || self.visible.rows.is_empty() {
            self.viewport.offset = 0;
            return;
        }

        self.viewport.offset = self
            .viewport
            .offset
            .min(self.visible.rows.len().saturating_sub(1));

        if self.selection.focus.axis == Axis::Rows {
            let focus = self.selection.focus.index;
            if focus < self.viewport.offset {
                self.viewport.offset = focus;
            } else if focus >= self.viewport.offset + data_rows {
                self.viewport.offset = focus + 1 - data_rows;
            }
        }
    }

    fn materialize(&self) -> Selection {
        Selection::materialize(&self.matrix, &self.visible, &self.selection)
    }

    /// Applies one action. Selection-set changes on the column axis trigger
    /// a full refresh because they feed back into row visibility.
    pub fn apply(&mut self, action: Action, layout: &FrameLayout) -> ApplyOutcome {
        match action {
            Action::Cancel => return ApplyOutcome::Done(SessionOutcome::Cancelled),
            Action::Finalize => {
                return ApplyOutcome::Done(SessionOutcome::Finalized(self.materialize()))
            }
            Action::Rerun => {
                return ApplyOutcome::Done(SessionOutcome::Rerun(self.materialize()))
            }
            Action::CycleMode => {
                self.query.mode = self.query.mode.cycle();
                self.refresh();
            }
            Action::ToggleCase => {
                self.query.case_sensitive = !self.query.case_sensitive;
                self.refresh();
            }
            Action::Move(direction) => {
                self.selection.move_focus(direction, &self.visible);
                self.refresh();
            }
            Action::SwitchAxis => {
                self.selection.switch_axis(&self.visible);
                self.refresh();
            }
            Action::ToggleFocused => {
                self.selection.toggle_focused(&self.visible);
                if self.selection.focus.axis == Axis::Columns {
                    self.refresh();
                }
            }
            Action::ToggleColumnNumber(n) => {
                self.selection.toggle_nth_visible_column(n, &self.visible);
                self.refresh();
            }
            Action::SelectAllFocused => {
                self.selection.select_all_focused(&self.visible);
                if self.selection.focus.axis == Axis::Columns {
                    self.refresh();
                }
            }
            Action::ClearFocused => {
                self.selection.clear_focused();
                if self.selection.focus.axis == Axis::Columns {
                    self.refresh();
                }
            }
            Action::QueryChar(character) => {
                self.query.text.push(character);
                self.refresh();
            }
            Action::QueryBackspace => {
                if self.query.text.pop().is_none() {
                    return ApplyOutcome::Continue { redraw: false };
                }
                self.refresh();
            }
            Action::Click { column, row } => {
                // Only the header and data rows are clickable; the query and
                // status lines are not.
                let last_data_row = ui::FIRST_DATA_ROW + self.viewport.data_rows() as u16;
                if row < ui::HEADER_ROW || row >= last_data_row {
                    return ApplyOutcome::Continue { redraw: false };
                }
                let Some(matrix_column) = layout.column_at(column) else {
                    return ApplyOutcome::Continue { redraw: false };
                };
                self.selection.toggle_column(matrix_column);
                self.refresh();
            }
            Action::Resize { width, height } => {
                self.viewport.width = width;
                self.viewport.height = height;
                self.scroll_to_focus();
            }
        }

        ApplyOutcome::Continue { redraw: true }
    }
}

/// Raw mode, the alternate screen and mouse capture, restored on drop so no
/// exit path leaves the terminal unusable.
struct TerminalGuard;

impl TerminalGuard {
    fn acquire(out: &mut impl Write) -> Result<Self> {
        enable_raw_mode().map_err(Error::TerminalSetup)?;
        if let Err(original) = execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide) {
            let _ = disable_raw_mode();
            return Err(Error::TerminalSetup(original));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stderr();
        let _ = execute!(out, Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Runs one interactive session over the matrix until the user finalizes,
/// cancels or asks for a rerun.
///
/// Frames go to stderr: stdout may be the downstream pipe.
///
/// # Errors
///
/// Returns an error when the terminal cannot be set up or an event cannot
/// be read. Everything key-local is absorbed into the session state.
pub fn run_session(matrix: Matrix, query: Query) -> Result<SessionOutcome> {
    let mut out = io::stderr();
    let _guard = TerminalGuard::acquire(&mut out)?;

    let (width, height) = size().map_err(Error::TerminalSetup)?;
    debug!(
        "Session over {} lines x {} columns ({width}x{height} terminal)",
        matrix.line_count(),
        matrix.column_count(),
    );

    let mut state = SessionState::new(matrix, query, width, height);
    let mut layout = ui::draw(&mut out, &state)?;

    loop {
        let event = event::read()?;
        let Some(action) = input::translate_event(&event) else {
            continue;
        };

        match state.apply(action, &layout) {
            ApplyOutcome::Done(outcome) => return Ok(outcome),
            ApplyOutcome::Continue { redraw: true } => {
                layout = ui::draw(&mut out, &state)?;
            }
            ApplyOutcome::Continue { redraw: false } => {}
        }
    }
}
