//! Two-axis selection state and the derived visible set.
//!
//! Rows and columns are selected independently; focus moves along one axis
//! at a time. The visible set is recomputed from scratch whenever the query
//! or the column restriction changes, and focus is clamped back into it.

use std::collections::HashSet;

use crate::matcher::CompiledQuery;
use crate::tokenizer::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    Rows,
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Focus {
    pub axis: Axis,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The derived view of the matrix under the current query.
///
/// Both lists are ascending matrix indexes. Never stored across recomputes:
/// the same (matrix, query, restriction) always produces the same set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibleSet {
    pub rows: Vec<usize>,
    pub columns: Vec<usize>,
}

impl VisibleSet {
    /// Recomputes visibility from scratch.
    ///
    /// A row is visible when any of its fields matches the query, considering
    /// only `restrict_columns` when that set is non-empty. A column is
    /// visible when any row of the matrix has a matching field in it; the
    /// column axis ignores the restriction so that narrowing rows to one
    /// column never removes the other columns from navigation. Rows with no
    /// fields (blank lines) are never visible.
    #[must_use]
    pub fn recompute(
        matrix: &Matrix,
        query: &CompiledQuery,
        restrict_columns: &HashSet<usize>,
    ) -> Self {
        let rows: Vec<usize> = matrix
            .lines()
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                line.fields().enumerate().any(|(column, field)| {
                    (restrict_columns.is_empty() || restrict_columns.contains(&column))
                        && query.match_fragment(field).is_match
                })
            })
            .map(|(row, _)| row)
            .collect();

        let columns: Vec<usize> = (0..matrix.column_count())
            .filter(|&column| {
                matrix.lines().iter().any(|line| {
                    line.field(column)
                        .is_some_and(|field| query.match_fragment(field).is_match)
                })
            })
            .collect();

        Self { rows, columns }
    }

    #[must_use]
    pub fn axis_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Rows => self.rows.len(),
            Axis::Columns => self.columns.len(),
        }
    }
}

/// Which rows and columns are selected, and where focus sits.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    pub selected_rows: HashSet<usize>,
    pub selected_columns: HashSet<usize>,
    pub focus: Focus,
}

impl SelectionState {
    pub fn toggle_row(&mut self, row: usize) {
        if !self.selected_rows.remove(&row) {
            self.selected_rows.insert(row);
        }
    }

    pub fn toggle_column(&mut self, column: usize) {
        if !self.selected_columns.remove(&column) {
            self.selected_columns.insert(column);
        }
    }

    /// Toggles the row or column under focus. No-op on an empty axis.
    pub fn toggle_focused(&mut self, visible: &VisibleSet) {
        match self.focus.axis {
            Axis::Rows => {
                if let Some(&row) = visible.rows.get(self.focus.index) {
                    self.toggle_row(row);
                }
            }
            Axis::Columns => {
                if let Some(&column) = visible.columns.get(self.focus.index) {
                    self.toggle_column(column);
                }
            }
        }
    }

    /// Toggles the Nth visible column, 1-based (the Alt-digit shortcut).
    pub fn toggle_nth_visible_column(&mut self, n: usize, visible: &VisibleSet) {
        if n == 0 {
            return;
        }
        if let Some(&column) = visible.columns.get(n - 1) {
            self.toggle_column(column);
        }
    }

    /// Selects every visible index on the focused axis.
    pub fn select_all_focused(&mut self, visible: &VisibleSet) {
        match self.focus.axis {
            Axis::Rows => self.selected_rows.extend(visible.rows.iter().copied()),
            Axis::Columns => self
                .selected_columns
                .extend(visible.columns.iter().copied()),
        }
    }

    /// Clears the selection on the focused axis.
    pub fn clear_focused(&mut self) {
        match self.focus.axis {
            Axis::Rows => self.selected_rows.clear(),
            Axis::Columns => self.selected_columns.clear(),
        }
    }

    /// Moves focus along its axis (wrapping) or across axes.
    ///
    /// Up/Down move through rows; Left/Right move through columns. Moving
    /// perpendicular to the focused axis switches axes instead.
    pub fn move_focus(&mut self, direction: Direction, visible: &VisibleSet) {
        match (direction, self.focus.axis) {
            (Direction::Up, Axis::Rows) => self.step_back(visible),
            (Direction::Down, Axis::Rows) => self.step_forward(visible),
            (Direction::Left, Axis::Columns) => self.step_back(visible),
            (Direction::Right, Axis::Columns) => self.step_forward(visible),
            (Direction::Up | Direction::Down, Axis::Columns)
            | (Direction::Left | Direction::Right, Axis::Rows) => self.switch_axis(visible),
        }
    }

    /// Toggles the focused axis (the Tab shortcut), keeping the index valid.
    pub fn switch_axis(&mut self, visible: &VisibleSet) {
        self.focus.axis = match self.focus.axis {
            Axis::Rows => Axis::Columns,
            Axis::Columns => Axis::Rows,
        };
        self.clamp_focus(visible);
    }

    fn step_forward(&mut self, visible: &VisibleSet) {
        let len = visible.axis_len(self.focus.axis);
        if len > 0 {
            self.focus.index = (self.focus.index + 1) % len;
        }
    }

    fn step_back(&mut self, visible: &VisibleSet) {
        let len = visible.axis_len(self.focus.axis);
        if len > 0 {
            self.focus.index = self.focus.index.checked_sub(1).unwrap_or(len - 1);
        }
    }

    /// Snaps focus back inside the visible set after it shrank.
    ///
    /// On an empty axis the index is pinned at zero and every focus
    /// operation becomes a no-op until rows reappear.
    pub fn clamp_focus(&mut self, visible: &VisibleSet) {
        let len = visible.axis_len(self.focus.axis);
        if len == 0 {
            self.focus.index = 0;
        } else if self.focus.index >= len {
            self.focus.index = len - 1;
        }
    }
}

/// The finalized, immutable result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    lines: Vec<String>,
}

impl Selection {
    /// Materializes the result from the current state.
    ///
    /// Explicitly selected rows are used when any exist, otherwise every
    /// visible row is taken. Selected columns restrict each emitted line to
    /// those fields (re-joined by a single space); with no column selection
    /// the original line is emitted verbatim.
    #[must_use]
    pub fn materialize(matrix: &Matrix, visible: &VisibleSet, state: &SelectionState) -> Self {
        let mut columns: Vec<usize> = state.selected_columns.iter().copied().collect();
        columns.sort_unstable();

        let lines = visible
            .rows
            .iter()
            .filter(|row| state.selected_rows.is_empty() || state.selected_rows.contains(row))
            .filter_map(|&row| matrix.line(row))
            .map(|line| {
                if columns.is_empty() {
                    line.raw().to_string()
                } else {
                    columns
                        .iter()
                        .filter_map(|&column| line.field(column))
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            })
            .collect();

        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The newline-joined result text, with a trailing newline when
    /// non-empty.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.lines.is_empty() {
            String::new()
        } else {
            let mut text = self.lines.join("\n");
            text.push('\n');
            text
        }
    }
}
