//! Command-line argument parsing.
//!
//! Flags only seed the initial query state and the delimiter policy; all
//! further state changes happen inside the interactive session.

use clap::Parser;
use colander_core::matcher::{Query, SearchMode};
use colander_core::tokenizer::DelimiterPolicy;

/// Command-line arguments for the colander binary.
#[derive(Parser, Debug)]
#[command(name = "colander", term_width = 0)]
pub struct Args {
    /// Start in fuzzy (subsequence) search mode.
    #[arg(long, short = 'f', action, conflicts_with = "regex")]
    pub fuzzy: bool,

    /// Start in regular-expression search mode.
    #[arg(long, short = 'r', action)]
    pub regex: bool,

    /// Match case-insensitively.
    #[arg(long, short = 'i', action)]
    pub case_insensitive: bool,

    /// Split lines into columns on this character instead of runs of
    /// whitespace.
    #[arg(long, short = 'd')]
    pub delimiter: Option<char>,
}

impl Args {
    /// The query state the session starts with.
    #[must_use]
    pub fn initial_query(&self) -> Query {
        let mode = if self.fuzzy {
            SearchMode::Fuzzy
        } else if self.regex {
            SearchMode::Regex
        } else {
            SearchMode::Plain
        };

        Query::new(mode, !self.case_insensitive)
    }

    #[must_use]
    pub fn delimiter_policy(&self) -> DelimiterPolicy {
        match self.delimiter {
            Some(delimiter) => DelimiterPolicy::Fixed(delimiter),
            None => DelimiterPolicy::Whitespace,
        }
    }
}
