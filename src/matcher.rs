//! Term matching over free text.
//!
//! Text and terms go through the same normalization before comparison:
//!
//! - Runs of whitespace and underscores collapse to a single space, so a term
//!   `red_car` matches `red car`, `red_car` and `red   car`. Hyphens and other
//!   punctuation are left alone.
//! - Without `case_sensitive`, both sides are lowercased char by char.
//! - Terms are additionally trimmed of leading and trailing separators.
//!
//! With `whole_word`, an occurrence only counts when it is not glued to a word
//! character on either side. Word characters are Unicode alphanumerics and
//! combining marks, so neither a decomposed accent nor the mark left by case
//! folding (`İ` lowers to `i` plus U+0307) opens a boundary. Everything else
//! (whitespace, the normalized underscore, punctuation, symbols) is a
//! boundary. A term whose own edge is not a word character (e.g. `c++`)
//! needs no boundary on that edge.

use std::cell::OnceCell;

use unicode_normalization::char::is_combining_mark;

use crate::types::MatchOptions;

/// Whether `term` occurs in `text` under `options`.
///
/// A term that is empty after normalization never matches.
#[must_use]
pub fn term_present(text: &str, term: &str, options: MatchOptions) -> bool {
    PreparedText::new(text).contains(term, options)
}

/// A text normalized once per evaluation, shared by every term lookup.
///
/// The case-folded form is only built if a case-insensitive term asks for it.
#[derive(Debug)]
pub(crate) struct PreparedText {
    exact: String,
    folded: OnceCell<String>,
}

impl PreparedText {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            exact: collapse_separators(text, false),
            folded: OnceCell::new(),
        }
    }

    fn haystack(&self, case_sensitive: bool) -> &str {
        if case_sensitive {
            &self.exact
        } else {
            self.folded.get_or_init(|| fold_case(&self.exact))
        }
    }

    pub(crate) fn contains(&self, term: &str, options: MatchOptions) -> bool {
        let needle = normalize_term(term, options.case_sensitive);
        if needle.is_empty() {
            return false;
        }
        let haystack = self.haystack(options.case_sensitive);
        if options.whole_word {
            contains_whole_word(haystack, &needle)
        } else {
            haystack.contains(needle.as_str())
        }
    }
}

/// Whether a term normalizes to nothing and can never match.
pub(crate) fn is_blank_term(term: &str) -> bool {
    term.chars().all(is_separator)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

fn collapse_separators(s: &str, fold: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if is_separator(c) {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
            continue;
        }
        in_run = false;
        if fold {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// Char-wise on purpose: str::to_lowercase special-cases a final sigma, which
// would let folding depend on surrounding text.
fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

fn normalize_term(term: &str, case_sensitive: bool) -> String {
    collapse_separators(term.trim_matches(is_separator), !case_sensitive)
}

fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let needs_left = needle.chars().next().is_some_and(is_word_char);
    let needs_right = needle.chars().next_back().is_some_and(is_word_char);

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();

        let left_ok = !needs_left
            || !haystack[..start].chars().next_back().is_some_and(is_word_char);
        let right_ok = !needs_right || !haystack[end..].chars().next().is_some_and(is_word_char);
        if left_ok && right_ok {
            return true;
        }

        // Overlapping occurrences must be considered too, so step a single char.
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
