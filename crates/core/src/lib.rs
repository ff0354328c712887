//! Colander Core Library
//!
//! This crate provides the terminal-free core of colander, an interactive
//! filter that narrows command output down by rows and columns before piping
//! it onward.
//!
//! # Key Features
//!
//! - **Tokenizer**: split raw text into lines and delimiter-derived fields
//!   while preserving the original lines for faithful output
//! - **Matcher**: plain substring, fuzzy subsequence and regex matching with
//!   scores and highlight spans
//! - **Selection Model**: two-axis row/column selection with a derived
//!   visible set and focus clamping
//! - **Pipeline**: typed command-template plans, subprocess capture and
//!   placeholder substitution
//! - **Error Handling**: one error type covering every failure mode, with a
//!   recoverable/fatal split
//!
//! # Examples
//!
//! Filtering lines the way the interactive session does:
//!
//! ```
//! use std::collections::HashSet;
//! use colander_core::matcher::{Query, SearchMode};
//! use colander_core::selection::{Selection, SelectionState, VisibleSet};
//! use colander_core::tokenizer::{DelimiterPolicy, Matrix};
//!
//! let matrix = Matrix::tokenize("apple 1\nbanana 2\n", DelimiterPolicy::Whitespace);
//! let query = Query {
//!     text: "apple".to_string(),
//!     mode: SearchMode::Plain,
//!     case_sensitive: false,
//! }
//! .compile();
//!
//! let visible = VisibleSet::recompute(&matrix, &query, &HashSet::new());
//! let result = Selection::materialize(&matrix, &visible, &SelectionState::default());
//! assert_eq!(result.to_text(), "apple 1\n");
//! ```

pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod selection;
pub mod tokenizer;
