use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::options::MatchOptions;
use super::rule::RuleId;

/// The rule that flagged a text, with the terms responsible.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    rule_id: RuleId,
    rule_name: String,
    options: Option<MatchOptions>,
    hits: BTreeSet<String>,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {})", self.rule_name, self.rule_id)?;
        if !self.hits.is_empty() {
            let hits: Vec<&str> = self.hits.iter().map(String::as_str).collect();
            write!(f, ": {}", hits.join(", "))?;
        }
        Ok(())
    }
}

impl Verdict {
    pub fn new(
        rule_id: RuleId,
        rule_name: impl Into<String>,
        options: Option<MatchOptions>,
        hits: BTreeSet<String>,
    ) -> Self {
        Self {
            rule_id,
            rule_name: rule_name.into(),
            options,
            hits,
        }
    }

    #[must_use]
    pub fn rule_id(&self) -> RuleId {
        self.rule_id
    }

    #[must_use]
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Options of the rule's root node, when the root is a leaf.
    #[must_use]
    pub fn options(&self) -> Option<MatchOptions> {
        self.options
    }

    #[must_use]
    pub fn hits(&self) -> &BTreeSet<String> {
        &self.hits
    }

    #[must_use]
    pub fn into_hits(self) -> BTreeSet<String> {
        self.hits
    }

    /// The record a blacklisting pipeline stores next to a flagged item.
    pub fn flag(&self) -> FlagRecord {
        FlagRecord {
            reason: FlagRecord::REASON.to_owned(),
            rule_id: self.rule_id,
            rule_name: self.rule_name.clone(),
            options: self.options,
            hits: self.hits.iter().cloned().collect(),
        }
    }
}

/// Serializable explanation of why an item was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRecord {
    pub reason: String,
    pub rule_id: RuleId,
    pub rule_name: String,
    pub options: Option<MatchOptions>,
    pub hits: Vec<String>,
}

impl FlagRecord {
    pub const REASON: &'static str = "moderation:rule";
}
