//! Query matching over text fragments.
//!
//! A [`Query`] is compiled once per change into a [`CompiledQuery`]; matching
//! a fragment is then a pure function of (fragment, compiled query), so the
//! same pair always yields the same [`MatchResult`]. An unparsable regex
//! compiles into an *invalid* query that matches nothing and is flagged for
//! the renderer, never an error.

use std::fmt::{Display, Formatter};
use std::ops::Range;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Plain,
    Fuzzy,
    Regex,
}

impl SearchMode {
    /// The next mode in the Plain -> Fuzzy -> Regex -> Plain cycle.
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            SearchMode::Plain => SearchMode::Fuzzy,
            SearchMode::Fuzzy => SearchMode::Regex,
            SearchMode::Regex => SearchMode::Plain,
        }
    }
}

impl Display for SearchMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Plain => f.write_str("plain"),
            SearchMode::Fuzzy => f.write_str("fuzzy"),
            SearchMode::Regex => f.write_str("regex"),
        }
    }
}

/// The live query state: text, search mode and case sensitivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
}

impl Query {
    #[must_use]
    pub fn new(mode: SearchMode, case_sensitive: bool) -> Self {
        Self {
            text: String::new(),
            mode,
            case_sensitive,
        }
    }

    #[must_use]
    pub fn compile(&self) -> CompiledQuery {
        let engine = if self.text.is_empty() {
            Engine::MatchAll
        } else {
            match self.mode {
                SearchMode::Plain => Engine::Plain {
                    needle: if self.case_sensitive {
                        self.text.clone()
                    } else {
                        self.text.to_lowercase()
                    },
                },
                SearchMode::Fuzzy => {
                    let matcher = if self.case_sensitive {
                        SkimMatcherV2::default().respect_case()
                    } else {
                        SkimMatcherV2::default().ignore_case()
                    };
                    Engine::Fuzzy {
                        matcher: Box::new(matcher),
                    }
                }
                SearchMode::Regex => {
                    match RegexBuilder::new(&self.text)
                        .case_insensitive(!self.case_sensitive)
                        .build()
                    {
                        Ok(pattern) => Engine::Regex { pattern },
                        Err(_) => Engine::Invalid,
                    }
                }
            }
        };

        CompiledQuery {
            query: self.clone(),
            engine,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new(SearchMode::Plain, true)
    }
}

/// The outcome of matching one fragment against one query.
///
/// `spans` are byte ranges into the fragment, used for highlighting only.
/// `score` ranks fuzzy matches; it never decides inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    pub is_match: bool,
    pub score: i64,
    pub spans: Vec<Range<usize>>,
}

impl MatchResult {
    fn miss() -> Self {
        Self::default()
    }

    fn hit(score: i64, spans: Vec<Range<usize>>) -> Self {
        Self {
            is_match: true,
            score,
            spans,
        }
    }
}

enum Engine {
    /// Empty query text: every fragment matches, nothing is highlighted.
    MatchAll,
    Plain { needle: String },
    Fuzzy { matcher: Box<SkimMatcherV2> },
    Regex { pattern: Regex },
    /// Unparsable regex. Matches nothing until the pattern is corrected.
    Invalid,
}

/// A query compiled for repeated matching.
pub struct CompiledQuery {
    query: Query,
    engine: Engine,
}

impl CompiledQuery {
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// True when the query is a regex that failed to parse.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self.engine, Engine::Invalid)
    }

    #[must_use]
    pub fn match_fragment(&self, fragment: &str) -> MatchResult {
        match &self.engine {
            Engine::MatchAll => MatchResult::hit(0, Vec::new()),
            Engine::Plain { needle } => self.match_plain(fragment, needle),
            Engine::Fuzzy { matcher } => match_fuzzy(fragment, &self.query.text, matcher),
            Engine::Regex { pattern } => match_regex(fragment, pattern),
            Engine::Invalid => MatchResult::miss(),
        }
    }

    fn match_plain(&self, fragment: &str, needle: &str) -> MatchResult {
        if self.query.case_sensitive {
            return plain_spans(fragment, needle);
        }
        if fragment.is_ascii() {
            return plain_spans(&fragment.to_ascii_lowercase(), needle);
        }
        folded_spans(fragment, needle)
    }
}

/// Case-insensitive substring search on a non-ASCII fragment.
///
/// Lowercasing can change a character's byte length, so the fold is done per
/// char while recording which original bytes each folded byte came from;
/// matches in the folded text are mapped back through that record.
fn folded_spans(fragment: &str, needle: &str) -> MatchResult {
    let mut folded = String::new();
    let mut origins: Vec<Range<usize>> = Vec::new();

    for (byte, character) in fragment.char_indices() {
        let origin = byte..byte + character.len_utf8();
        for lower in character.to_lowercase() {
            folded.push(lower);
        }
        origins.resize(folded.len(), origin);
    }

    let spans: Vec<Range<usize>> = folded
        .match_indices(needle)
        .filter_map(|(start, matched)| {
            let first = origins.get(start)?;
            let last = origins.get(start + matched.len() - 1)?;
            Some(first.start..last.end)
        })
        .collect();

    if spans.is_empty() {
        MatchResult::miss()
    } else {
        MatchResult::hit(1, spans)
    }
}

fn plain_spans(haystack: &str, needle: &str) -> MatchResult {
    let spans: Vec<Range<usize>> = haystack
        .match_indices(needle)
        .map(|(start, matched)| start..start + matched.len())
        .collect();

    if spans.is_empty() {
        MatchResult::miss()
    } else {
        MatchResult::hit(1, spans)
    }
}

fn match_fuzzy(fragment: &str, pattern: &str, matcher: &SkimMatcherV2) -> MatchResult {
    match matcher.fuzzy_indices(fragment, pattern) {
        None => MatchResult::miss(),
        Some((score, char_indices)) => {
            MatchResult::hit(score, char_indices_to_spans(fragment, &char_indices))
        }
    }
}

fn match_regex(fragment: &str, pattern: &Regex) -> MatchResult {
    let spans: Vec<Range<usize>> = pattern
        .find_iter(fragment)
        .map(|found| found.range())
        .collect();

    if spans.is_empty() {
        MatchResult::miss()
    } else {
        MatchResult::hit(1, spans)
    }
}

/// Converts matched char positions into merged byte ranges.
fn char_indices_to_spans(fragment: &str, char_indices: &[usize]) -> Vec<Range<usize>> {
    let boundaries: Vec<(usize, usize)> = fragment
        .char_indices()
        .map(|(byte, character)| (byte, byte + character.len_utf8()))
        .collect();

    let mut spans: Vec<Range<usize>> = Vec::new();
    for &char_index in char_indices {
        let Some(&(start, end)) = boundaries.get(char_index) else {
            continue;
        };
        match spans.last_mut() {
            Some(last) if last.end == start => last.end = end,
            _ => spans.push(start..end),
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str, mode: SearchMode, case_sensitive: bool) -> CompiledQuery {
        Query {
            text: text.to_string(),
            mode,
            case_sensitive,
        }
        .compile()
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = compile("", SearchMode::Plain, true);

        assert!(query.match_fragment("anything").is_match);
        assert!(query.match_fragment("").is_match);
    }

    #[test]
    fn test_plain_case_sensitive() {
        let query = compile("Apple", SearchMode::Plain, true);

        assert!(query.match_fragment("an Apple a day").is_match);
        assert!(!query.match_fragment("an apple a day").is_match);
    }

    #[test]
    fn test_plain_case_insensitive() {
        let query = compile("APPLE", SearchMode::Plain, false);

        let result = query.match_fragment("an apple a day");
        assert!(result.is_match);
        assert_eq!(result.spans, vec![3..8]);
    }

    #[test]
    fn test_plain_reports_every_occurrence() {
        let query = compile("ab", SearchMode::Plain, true);

        let result = query.match_fragment("ab ab");
        assert_eq!(result.spans, vec![0..2, 3..5]);
    }

    #[test]
    fn test_fuzzy_is_a_subsequence_match() {
        let query = compile("ale", SearchMode::Fuzzy, true);

        assert!(query.match_fragment("apple").is_match);
        assert!(!query.match_fragment("elppa").is_match);
        assert!(!query.match_fragment("ela").is_match);
    }

    #[test]
    fn test_fuzzy_score_never_decides_inclusion() {
        let query = compile("abc", SearchMode::Fuzzy, true);

        // A sparse subsequence still matches, just with a lower score.
        let tight = query.match_fragment("abc");
        let sparse = query.match_fragment("a--b--c");
        assert!(tight.is_match);
        assert!(sparse.is_match);
        assert!(tight.score > sparse.score);
    }

    #[test]
    fn test_fuzzy_spans_cover_query_characters() {
        let query = compile("ae", SearchMode::Fuzzy, true);

        let result = query.match_fragment("apple");
        assert!(result.is_match);
        assert_eq!(result.spans, vec![0..1, 4..5]);
    }

    #[test]
    fn test_regex_anchored_pattern() {
        let query = compile("^abc", SearchMode::Regex, true);

        assert!(query.match_fragment("abc123").is_match);
        assert!(!query.match_fragment("xabc").is_match);
    }

    #[test]
    fn test_regex_case_insensitive_flag() {
        let query = compile("^abc", SearchMode::Regex, false);

        assert!(query.match_fragment("ABC123").is_match);
    }

    #[test]
    fn test_invalid_regex_matches_nothing_and_is_flagged() {
        let query = compile("(unbalanced", SearchMode::Regex, true);

        assert!(query.is_invalid());
        assert!(!query.match_fragment("(unbalanced").is_match);
        assert!(!query.match_fragment("anything").is_match);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let query = compile("app", SearchMode::Fuzzy, false);

        let first = query.match_fragment("apple application");
        let second = query.match_fragment("apple application");
        assert_eq!(first, second);
    }

    #[test]
    fn test_mode_cycle_order() {
        assert_eq!(SearchMode::Plain.cycle(), SearchMode::Fuzzy);
        assert_eq!(SearchMode::Fuzzy.cycle(), SearchMode::Regex);
        assert_eq!(SearchMode::Regex.cycle(), SearchMode::Plain);
    }

    #[test]
    fn test_non_ascii_case_fold_still_matches() {
        let query = compile("strasse", SearchMode::Plain, false);

        // 'İ' grows from two to three bytes under lowercasing; the span
        // must land on the original bytes regardless.
        let result = query.match_fragment("İstanbul strasse");
        assert!(result.is_match);
        assert_eq!(result.spans, vec![10..17]);
    }

    #[test]
    fn test_spans_survive_length_preserving_case_folds() {
        let query = compile("x", SearchMode::Plain, false);

        // 'İ' grows and 'ẞ' shrinks under lowercasing, so the total byte
        // length is unchanged while every offset after 'İ' has shifted.
        let result = query.match_fragment("İxẞ");
        assert!(result.is_match);
        assert_eq!(result.spans, vec![2..3]);
    }
}
