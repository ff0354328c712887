//! Splits raw input text into lines and delimiter-derived fields.
//!
//! A [`Line`] keeps the original text verbatim and records each field as a
//! byte range into it, so the final output can reproduce input lines exactly
//! while matching and display work on the derived fields.

use std::ops::Range;

/// How a line is split into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterPolicy {
    /// Collapse runs of whitespace; leading/trailing runs produce no field.
    #[default]
    Whitespace,
    /// Split on every occurrence of the character; empty fields are kept.
    Fixed(char),
}

/// A single input line: the raw text plus its derived fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    raw: String,
    fields: Vec<Range<usize>>,
}

impl Line {
    fn new(raw: String, policy: DelimiterPolicy) -> Self {
        let fields = match policy {
            DelimiterPolicy::Whitespace => split_whitespace_ranges(&raw),
            DelimiterPolicy::Fixed(delimiter) => split_fixed_ranges(&raw, delimiter),
        };

        Self { raw, fields }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|range| &self.raw[range.clone()])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|range| &self.raw[range.clone()])
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// A line with no fields, e.g. blank or (under a whitespace policy)
    /// whitespace-only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.is_empty()
    }
}

fn split_whitespace_ranges(raw: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;

    for (position, character) in raw.char_indices() {
        if character.is_whitespace() {
            if let Some(field_start) = start.take() {
                ranges.push(field_start..position);
            }
        } else if start.is_none() {
            start = Some(position);
        }
    }

    if let Some(field_start) = start {
        ranges.push(field_start..raw.len());
    }

    ranges
}

fn split_fixed_ranges(raw: &str, delimiter: char) -> Vec<Range<usize>> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut start = 0;

    for (position, character) in raw.char_indices() {
        if character == delimiter {
            ranges.push(start..position);
            start = position + character.len_utf8();
        }
    }

    ranges.push(start..raw.len());
    ranges
}

/// The ordered sequence of all lines for one session.
///
/// Immutable after ingestion; the visible subset is always derived from it,
/// never stored back.
#[derive(Debug, Clone, Default)]
pub struct Matrix {
    lines: Vec<Line>,
    column_count: usize,
}

impl Matrix {
    /// Splits `raw_text` on newlines and each line into fields.
    ///
    /// Empty input yields an empty matrix, which is a valid, displayable
    /// state rather than an error.
    #[must_use]
    pub fn tokenize(raw_text: &str, policy: DelimiterPolicy) -> Self {
        let lines: Vec<Line> = raw_text
            .lines()
            .map(|line| Line::new(line.trim_end_matches('\r').to_string(), policy))
            .collect();

        let column_count = lines.iter().map(Line::field_count).max().unwrap_or(0);

        Self {
            lines,
            column_count,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The widest field count over all lines.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_policy_collapses_runs() {
        let matrix = Matrix::tokenize("a   b\tc\n", DelimiterPolicy::Whitespace);

        assert_eq!(matrix.line_count(), 1);
        let line = matrix.line(0).unwrap();
        assert_eq!(line.fields().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(line.raw(), "a   b\tc");
    }

    #[test]
    fn test_whitespace_policy_discards_leading_and_trailing() {
        let matrix = Matrix::tokenize("  x y  ", DelimiterPolicy::Whitespace);

        let line = matrix.line(0).unwrap();
        assert_eq!(line.fields().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_fixed_policy_keeps_empty_fields() {
        let matrix = Matrix::tokenize("a::b:\n", DelimiterPolicy::Fixed(':'));

        let line = matrix.line(0).unwrap();
        assert_eq!(line.fields().collect::<Vec<_>>(), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_empty_input_is_a_valid_empty_matrix() {
        let matrix = Matrix::tokenize("", DelimiterPolicy::Whitespace);

        assert!(matrix.is_empty());
        assert_eq!(matrix.column_count(), 0);
    }

    #[test]
    fn test_blank_line_has_no_fields() {
        let matrix = Matrix::tokenize("a b\n   \nc\n", DelimiterPolicy::Whitespace);

        assert_eq!(matrix.line_count(), 3);
        assert!(matrix.line(1).unwrap().is_blank());
        assert_eq!(matrix.column_count(), 2);
    }

    #[test]
    fn test_crlf_line_endings_are_stripped() {
        let matrix = Matrix::tokenize("a b\r\nc d\r\n", DelimiterPolicy::Whitespace);

        assert_eq!(matrix.line_count(), 2);
        assert_eq!(matrix.line(0).unwrap().raw(), "a b");
    }

    #[test]
    fn test_raw_line_is_preserved_verbatim() {
        let raw = "  NAME     PID   TIME";
        let matrix = Matrix::tokenize(raw, DelimiterPolicy::Whitespace);

        assert_eq!(matrix.line(0).unwrap().raw(), raw);
        assert_eq!(matrix.line(0).unwrap().field(1), Some("PID"));
    }

    #[test]
    fn test_column_count_is_widest_line() {
        let matrix = Matrix::tokenize("a\nb c d\ne f\n", DelimiterPolicy::Whitespace);

        assert_eq!(matrix.column_count(), 3);
    }
}
