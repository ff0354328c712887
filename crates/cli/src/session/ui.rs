//! Frame rendering.
//!
//! A frame is a pure projection of the session state: query line, numbered
//! column header, data rows with selection markers and match highlighting,
//! and a status line. Nothing here mutates state; the returned
//! [`FrameLayout`] lets the input loop map mouse clicks back onto columns.

use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};
use itertools::Itertools;

use colander_core::error::Result;
use colander_core::matcher::CompiledQuery;
use colander_core::selection::Axis;

use crate::session::SessionState;

const QUERY_ROW: u16 = 0;
pub const HEADER_ROW: u16 = 1;
pub const FIRST_DATA_ROW: u16 = 2;

// "[x] " prefix in front of every data row.
const ROW_PREFIX_WIDTH: u16 = 4;
const COLUMN_GAP: u16 = 2;
const MAX_COLUMN_WIDTH: u16 = 48;

/// Where one visible column was drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub matrix_index: usize,
    pub x: u16,
    pub width: u16,
}

/// The column geometry of the last frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameLayout {
    pub columns: Vec<ColumnLayout>,
}

impl FrameLayout {
    /// Computes column positions from the widest visible cell per column,
    /// dropping columns that no longer fit the terminal width.
    #[must_use]
    pub fn compute(state: &SessionState) -> Self {
        let viewport_rows = viewport_rows(state);
        let mut columns = Vec::new();
        let mut x = ROW_PREFIX_WIDTH;

        for &matrix_index in &state.visible.columns {
            let header_width = header_label(state, matrix_index).chars().count() as u16;
            let cell_width = viewport_rows
                .iter()
                .filter_map(|&row| state.matrix.line(row))
                .filter_map(|line| line.field(matrix_index))
                .map(|field| field.chars().count() as u16)
                .max()
                .unwrap_or(0);

            let width = header_width.max(cell_width).clamp(1, MAX_COLUMN_WIDTH);
            if x + width > state.viewport.width {
                break;
            }

            columns.push(ColumnLayout {
                matrix_index,
                x,
                width,
            });
            x += width + COLUMN_GAP;
        }

        Self { columns }
    }

    /// The matrix column drawn at terminal column `x`, if any.
    #[must_use]
    pub fn column_at(&self, x: u16) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| x >= column.x && x < column.x + column.width)
            .map(|column| column.matrix_index)
    }
}

/// The slice of visible rows currently inside the viewport.
fn viewport_rows(state: &SessionState) -> Vec<usize> {
    state
        .visible
        .rows
        .iter()
        .skip(state.viewport.offset)
        .take(state.viewport.data_rows())
        .copied()
        .collect()
}

fn header_label(state: &SessionState, matrix_index: usize) -> String {
    let marker = if state.selection.selected_columns.contains(&matrix_index) {
        '*'
    } else {
        ' '
    };
    format!("{}{}", marker, matrix_index + 1)
}

/// Draws one full frame and returns its layout.
pub fn draw<W: Write>(out: &mut W, state: &SessionState) -> Result<FrameLayout> {
    let layout = FrameLayout::compute(state);

    queue!(out, Clear(ClearType::All), MoveTo(0, QUERY_ROW))?;
    draw_query_line(out, state)?;
    draw_header(out, state, &layout)?;

    if state.visible.rows.is_empty() {
        queue!(
            out,
            MoveTo(ROW_PREFIX_WIDTH, FIRST_DATA_ROW),
            SetForegroundColor(Color::Red),
            Print("No matching rows!"),
            SetForegroundColor(Color::Reset),
        )?;
    } else {
        draw_rows(out, state, &layout)?;
    }

    draw_status_line(out, state)?;
    out.flush()?;

    Ok(layout)
}

fn draw_query_line<W: Write>(out: &mut W, state: &SessionState) -> Result<()> {
    let mut caption = state.query.mode.to_string();
    if !state.query.case_sensitive {
        caption.push_str(" (case-ins)");
    }
    caption.push_str("> ");

    queue!(
        out,
        SetAttribute(Attribute::Bold),
        Print(caption),
        SetAttribute(Attribute::Reset),
        Print(&state.query.text),
    )?;

    if state.compiled.is_invalid() {
        queue!(
            out,
            SetForegroundColor(Color::Red),
            Print("  [invalid pattern]"),
            SetForegroundColor(Color::Reset),
        )?;
    }

    Ok(())
}

fn draw_header<W: Write>(out: &mut W, state: &SessionState, layout: &FrameLayout) -> Result<()> {
    let focused_column = focused_index(state, Axis::Columns);

    for column in &layout.columns {
        queue!(out, MoveTo(column.x, HEADER_ROW))?;
        let label = pad(&header_label(state, column.matrix_index), column.width);

        if focused_column == Some(column.matrix_index) {
            queue!(
                out,
                SetAttribute(Attribute::Bold),
                SetBackgroundColor(Color::DarkBlue),
                SetForegroundColor(Color::Yellow),
                Print(label),
                SetAttribute(Attribute::Reset),
                SetBackgroundColor(Color::Reset),
                SetForegroundColor(Color::Reset),
            )?;
        } else {
            queue!(out, Print(label))?;
        }
    }

    Ok(())
}

fn draw_rows<W: Write>(out: &mut W, state: &SessionState, layout: &FrameLayout) -> Result<()> {
    let focused_row = focused_index(state, Axis::Rows);

    for (screen_index, row) in viewport_rows(state).into_iter().enumerate() {
        let Some(line) = state.matrix.line(row) else {
            continue;
        };
        let y = FIRST_DATA_ROW + screen_index as u16;
        let is_focused = focused_row == Some(row);
        let marker = if state.selection.selected_rows.contains(&row) {
            "[x] "
        } else {
            "[ ] "
        };

        queue!(out, MoveTo(0, y))?;
        if is_focused {
            queue!(
                out,
                SetAttribute(Attribute::Bold),
                SetBackgroundColor(Color::DarkBlue),
                SetForegroundColor(Color::Yellow),
            )?;
        }
        queue!(out, Print(marker))?;

        for column in &layout.columns {
            queue!(out, MoveTo(column.x, y))?;
            let field = line.field(column.matrix_index).unwrap_or("");
            if is_focused {
                // The focus colors already mark the row; span colors would
                // fight them.
                queue!(out, Print(pad(field, column.width)))?;
            } else {
                draw_highlighted(out, field, &state.compiled, column.width)?;
            }
        }

        if is_focused {
            queue!(
                out,
                SetAttribute(Attribute::Reset),
                SetBackgroundColor(Color::Reset),
                SetForegroundColor(Color::Reset),
            )?;
        }
    }

    Ok(())
}

/// Prints a field with its matched spans in the highlight color, truncated
/// to the column width.
fn draw_highlighted<W: Write>(
    out: &mut W,
    field: &str,
    query: &CompiledQuery,
    width: u16,
) -> Result<()> {
    let result = query.match_fragment(field);
    if result.spans.is_empty() {
        queue!(out, Print(pad(field, width)))?;
        return Ok(());
    }

    let mut remaining = width as usize;
    let mut highlighted = false;

    for (byte, character) in field.char_indices() {
        if remaining == 0 {
            break;
        }
        let inside = result.spans.iter().any(|span| span.contains(&byte));
        if inside != highlighted {
            if inside {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    SetForegroundColor(Color::Yellow),
                )?;
            } else {
                queue!(
                    out,
                    SetAttribute(Attribute::Reset),
                    SetForegroundColor(Color::Reset),
                )?;
            }
            highlighted = inside;
        }
        queue!(out, Print(character))?;
        remaining -= 1;
    }

    if highlighted {
        queue!(
            out,
            SetAttribute(Attribute::Reset),
            SetForegroundColor(Color::Reset),
        )?;
    }
    queue!(out, Print(" ".repeat(remaining)))?;

    Ok(())
}

fn draw_status_line<W: Write>(out: &mut W, state: &SessionState) -> Result<()> {
    let y = state.viewport.height.saturating_sub(1);

    let selected_columns = state
        .selection
        .selected_columns
        .iter()
        .sorted()
        .map(|column| column + 1)
        .join(",");

    let mut left = format!(
        " {}/{} rows | {} selected",
        state.visible.rows.len(),
        state.matrix.line_count(),
        state.selection.selected_rows.len(),
    );
    if !selected_columns.is_empty() {
        left.push_str(&format!(" | cols {selected_columns}"));
    }

    let hint = "Alt-E mode  Alt-I case  Space select  Alt-R rerun  Enter accept  Esc cancel ";
    let width = state.viewport.width as usize;
    let padding = width.saturating_sub(left.chars().count() + hint.len());
    let mut content = format!("{left}{}{hint}", " ".repeat(padding));
    content = pad(&content, state.viewport.width);

    queue!(
        out,
        MoveTo(0, y),
        SetBackgroundColor(Color::DarkGreen),
        Print(content),
        SetBackgroundColor(Color::Reset),
    )?;

    Ok(())
}

/// Truncates to `width` characters and pads the remainder with spaces.
fn pad(text: &str, width: u16) -> String {
    let width = width as usize;
    let mut padded: String = text.chars().take(width).collect();
    let used = padded.chars().count();
    padded.push_str(&" ".repeat(width - used));
    padded
}

fn focused_index(state: &SessionState, axis: Axis) -> Option<usize> {
    if state.selection.focus.axis != axis {
        return None;
    }
    match axis {
        Axis::Rows => state.visible.rows.get(state.selection.focus.index).copied(),
        Axis::Columns => state
            .visible
            .columns
            .get(state.selection.focus.index)
            .copied(),
    }
}
