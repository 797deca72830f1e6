use std::collections::BTreeSet;
use std::fmt;

use super::error::{CompileError, NodeDefect};
use super::evaluation_report::EvaluationReport;
use super::node::RuleNode;
use super::rule::{ModerationRule, RuleDefinition, RuleId};
use super::verdict::Verdict;

/// Builder for constructing a [`RuleSet`].
///
/// # Example
///
/// ```
/// use termguard::{RuleSetBuilder, all, not_any};
///
/// let ruleset = RuleSetBuilder::new()
///     .rule("red_cars", |r| {
///         r.id(1).when(all(["car", "red"]).and(not_any(["sun"])))
///     })
///     .compile()
///     .unwrap();
///
/// assert!(ruleset.check("a red car by the sea"));
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<PendingRule>,
}

/// A rule as collected by the builder, before validation.
#[derive(Debug, Clone)]
pub(crate) struct PendingRule {
    pub(crate) name: String,
    pub(crate) id: Option<RuleId>,
    pub(crate) active: bool,
    pub(crate) condition: Option<RuleNode>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    active: bool,
    condition: Option<RuleNode>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure must call `.id(..)` and `.when(node)`.
    ///
    /// If either is missing, compilation fails with
    /// [`CompileError::MissingId`] or [`CompileError::MissingCondition`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            id: None,
            active: true,
            condition: None,
        });
        self.rules.push(PendingRule {
            name: name.to_owned(),
            id: builder.id,
            active: builder.active,
            condition: builder.condition,
        });
        self
    }

    /// Add an already assembled rule.
    #[must_use]
    pub fn add(mut self, rule: ModerationRule) -> Self {
        self.rules.push(PendingRule {
            name: rule.name,
            id: Some(rule.id),
            active: rule.active,
            condition: Some(rule.root),
        });
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if a rule lacks an id or condition, or if two
    /// rules share an id.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile_pending(self.rules)
    }
}

impl RuleBuilder {
    /// Set the rule's id.
    #[must_use]
    pub fn id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the root node of this rule.
    #[must_use]
    pub fn when(mut self, condition: RuleNode) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Keep the rule in the set but exclude it from evaluation.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A shape problem found in one of a rule set's trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefect {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub defect: NodeDefect,
}

impl fmt::Display for RuleDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule '{}' (id {}): {}",
            self.rule_name, self.rule_id, self.defect
        )
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind `Arc`.
///
/// Only active rules are kept for evaluation, in ascending name order; the
/// first rule whose tree matches a text wins. Names are compared byte-wise
/// (`"Zebra"` before `"apple"`), which may differ from a database collation.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub(crate) rules: Vec<ModerationRule>,
    pub(crate) inactive: usize,
    pub(crate) defects: Vec<RuleDefect>,
    #[cfg(feature = "binary-cache")]
    pub(crate) source_digest: Option<[u8; 32]>,
}

impl RuleSet {
    /// A rule set with no rules. Matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile a rule set from already assembled rules.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] if two rules share an id.
    pub fn from_rules(rules: impl IntoIterator<Item = ModerationRule>) -> Result<Self, CompileError> {
        crate::compile::compile(rules.into_iter().collect())
    }

    /// Compile stored rule definitions. Definitions that cannot be compiled
    /// become malformed nodes that never match; see [`defects()`](Self::defects).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] if two definitions share an id.
    pub fn from_definitions(definitions: &[RuleDefinition]) -> Result<Self, CompileError> {
        crate::compile::compile(
            definitions
                .iter()
                .map(crate::compile::compile_definition)
                .collect(),
        )
    }

    /// Parse a JSON array of rule definitions and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`TermguardError`](crate::TermguardError) on malformed JSON or
    /// duplicate ids.
    pub fn from_json(input: &str) -> Result<Self, crate::TermguardError> {
        let definitions: Vec<RuleDefinition> = serde_json::from_str(input)?;
        Ok(Self::from_definitions(&definitions)?)
    }

    /// Parse a DSL string and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`TermguardError`](crate::TermguardError) on parse or compile failure.
    pub fn from_dsl(input: &str) -> Result<Self, crate::TermguardError> {
        let parsed = crate::parse::parse(input)?;
        Ok(Self::from_rules(parsed.rules)?)
    }

    /// Read a DSL file and compile into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`TermguardError`](crate::TermguardError) on I/O, parse, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::TermguardError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }

    /// Whether any active rule matches `text`.
    #[must_use]
    pub fn check(&self, text: &str) -> bool {
        self.matched_rule(text).is_some()
    }

    /// The first active rule (in name order) whose tree matches `text`.
    #[must_use]
    pub fn matched_rule(&self, text: &str) -> Option<&ModerationRule> {
        let prepared = crate::matcher::PreparedText::new(text);
        crate::evaluate::first_match(&self.rules, &prepared).map(|idx| &self.rules[idx])
    }

    /// Terms responsible for the matching rule; empty when nothing matches.
    #[must_use]
    pub fn hits(&self, text: &str) -> BTreeSet<String> {
        self.evaluate(text).map(Verdict::into_hits).unwrap_or_default()
    }

    /// Evaluate this rule set against `text`.
    ///
    /// Returns the verdict of the first matching rule, or `None` if no rule matches.
    #[must_use]
    pub fn evaluate(&self, text: &str) -> Option<Verdict> {
        crate::evaluate::evaluate(&self.rules, text)
    }

    /// Evaluate with diagnostics: the rules considered and timing.
    pub fn evaluate_detailed(&self, text: &str) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(&self.rules, text)
    }

    /// Active rules in scan order.
    #[must_use]
    pub fn rules(&self) -> &[ModerationRule] {
        &self.rules
    }

    /// Active rule names in scan order.
    #[must_use]
    pub fn execution_order(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Look up an active rule by id.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&ModerationRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Shape problems found in active rules. Affected nodes never match.
    #[must_use]
    pub fn defects(&self) -> &[RuleDefect] {
        &self.defects
    }

    /// Number of active rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules dropped from evaluation because they are inactive.
    #[must_use]
    pub fn inactive_count(&self) -> usize {
        self.inactive
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this compiled rule set to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata. Callers can use this to detect when the original
    /// source has changed and the cache should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a compiled rule set from a byte slice previously
    /// produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this compiled rule set and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the compiled rule set it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// BLAKE3 digest of the source text this set was cached from, if any.
    #[must_use]
    pub fn source_digest(&self) -> Option<&[u8; 32]> {
        self.source_digest.as_ref()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} active rules, {} inactive, {} defects)",
            self.rules.len(),
            self.inactive,
            self.defects.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{all, any, at_least, not_any};

    #[test]
    fn builder_collects_rules() {
        let builder = RuleSetBuilder::new()
            .rule("cars", |r| r.id(1).when(any(["car"])))
            .rule("boats", |r| r.id(2).inactive().when(any(["boat"])));

        assert_eq!(builder.rules.len(), 2);
        assert_eq!(builder.rules[0].name, "cars");
        assert_eq!(builder.rules[0].id, Some(RuleId(1)));
        assert!(builder.rules[0].active);
        assert!(!builder.rules[1].active);
    }

    #[test]
    fn builder_rule_without_when_returns_error() {
        let result = RuleSetBuilder::new().rule("bad_rule", |r| r.id(1)).compile();
        assert!(matches!(
            result,
            Err(CompileError::MissingCondition { rule }) if rule == "bad_rule"
        ));
    }

    #[test]
    fn builder_rule_without_id_returns_error() {
        let result = RuleSetBuilder::new()
            .rule("bad_rule", |r| r.when(any(["x"])))
            .compile();
        assert!(matches!(
            result,
            Err(CompileError::MissingId { rule }) if rule == "bad_rule"
        ));
    }

    #[test]
    fn scan_order_is_by_name() {
        let ruleset = RuleSetBuilder::new()
            .rule("zebra", |r| r.id(1).when(any(["car"])))
            .rule("alpha", |r| r.id(2).when(any(["car"])))
            .rule("mid", |r| r.id(3).when(any(["car"])))
            .compile()
            .unwrap();
        assert_eq!(ruleset.execution_order(), vec!["alpha", "mid", "zebra"]);
        assert_eq!(ruleset.evaluate("a car").unwrap().rule_name(), "alpha");
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let ruleset = RuleSetBuilder::new()
            .rule("a_first", |r| r.id(1).inactive().when(any(["car"])))
            .rule("b_second", |r| r.id(2).when(any(["car"])))
            .compile()
            .unwrap();
        assert_eq!(ruleset.len(), 1);
        assert_eq!(ruleset.inactive_count(), 1);
        assert_eq!(ruleset.matched_rule("a car").unwrap().id, RuleId(2));
    }

    #[test]
    fn hits_come_from_the_winning_rule_only() {
        let ruleset = RuleSetBuilder::new()
            .rule("a", |r| r.id(1).when(all(["red", "car"])))
            .rule("b", |r| r.id(2).when(any(["car", "sea"])))
            .compile()
            .unwrap();
        let hits: Vec<String> = ruleset.hits("a red car by the sea").into_iter().collect();
        assert_eq!(hits, vec!["car".to_owned(), "red".to_owned()]);
    }

    #[test]
    fn no_match_means_empty_hits() {
        let ruleset = RuleSetBuilder::new()
            .rule("a", |r| r.id(1).when(any(["car"])))
            .compile()
            .unwrap();
        assert!(!ruleset.check("a boat"));
        assert!(ruleset.hits("a boat").is_empty());
        assert!(ruleset.evaluate("a boat").is_none());
    }

    #[test]
    fn empty_ruleset_matches_nothing() {
        let ruleset = RuleSet::empty();
        assert!(ruleset.is_empty());
        assert!(!ruleset.check("anything at all"));
    }

    #[test]
    fn defects_are_reported_per_rule() {
        let ruleset = RuleSetBuilder::new()
            .rule("broken", |r| r.id(5).when(at_least(3, ["a"]).and(not_any(["b"]))))
            .compile()
            .unwrap();
        assert_eq!(
            ruleset.defects(),
            &[RuleDefect {
                rule_id: RuleId(5),
                rule_name: "broken".into(),
                defect: NodeDefect::MinOutOfRange { min: 3, len: 1 },
            }]
        );
        assert!(!ruleset.check("a"));
    }

    #[test]
    fn display_summary() {
        let ruleset = RuleSetBuilder::new()
            .rule("a", |r| r.id(1).when(any(["car"])))
            .rule("b", |r| r.id(2).inactive().when(any(["car"])))
            .compile()
            .unwrap();
        assert_eq!(
            ruleset.to_string(),
            "RuleSet(1 active rules, 1 inactive, 0 defects)"
        );
    }
}
