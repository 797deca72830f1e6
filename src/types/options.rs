use std::fmt;

use serde::{Deserialize, Serialize};

/// Term matching options carried by every leaf node.
///
/// Options never inherit: a leaf without explicit options uses the defaults
/// (case-insensitive, whole-word), regardless of what its parents carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_word: true,
        }
    }
}

impl MatchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    #[must_use]
    pub fn whole_word(mut self, on: bool) -> Self {
        self.whole_word = on;
        self
    }

    pub(crate) fn is_default(self) -> bool {
        self == Self::default()
    }
}

/// Renders the non-default flags in rule DSL form, e.g. `[case_sensitive, substring]`.
/// Default options render as an empty string.
impl fmt::Display for MatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::with_capacity(2);
        if self.case_sensitive {
            flags.push("case_sensitive");
        }
        if !self.whole_word {
            flags.push("substring");
        }
        if flags.is_empty() {
            return Ok(());
        }
        write!(f, "[{}]", flags.join(", "))
    }
}
