use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::{CompileError, ModerationRule, RuleDefinition, RuleId, RuleSet, TermguardError, Verdict};

/// A moderation front end over a hot-swappable [`RuleSet`].
///
/// Uses `ArcSwap` for lock-free reads and atomic replacement: every check
/// runs against one complete snapshot, even while another thread loads a new
/// rule set. A moderator with nothing loaded behaves like an empty rule set
/// and matches nothing.
pub struct Moderator {
    inner: ArcSwap<RuleSet>,
}

impl Default for Moderator {
    fn default() -> Self {
        Self::new()
    }
}

impl Moderator {
    /// A moderator with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(RuleSet::empty()),
        }
    }

    /// A moderator starting from the given rule set.
    #[must_use]
    pub fn with_rules(ruleset: RuleSet) -> Self {
        let moderator = Self::new();
        moderator.load(ruleset);
        moderator
    }

    /// Atomically replace the active rule set.
    ///
    /// Shape problems in the new rules are logged and left in place; the
    /// affected nodes never match.
    pub fn load(&self, ruleset: RuleSet) {
        for defect in ruleset.defects() {
            warn!(
                rule_id = defect.rule_id.0,
                rule = %defect.rule_name,
                defect = %defect.defect,
                "malformed moderation rule node; it will never match"
            );
        }
        debug!(
            active = ruleset.len(),
            inactive = ruleset.inactive_count(),
            "loaded moderation rules"
        );
        self.inner.store(Arc::new(ruleset));
    }

    /// Replace the active rule set with a single rule.
    pub fn load_rule(&self, rule: ModerationRule) {
        // A single rule cannot collide with itself.
        if let Ok(ruleset) = RuleSet::from_rules([rule]) {
            self.load(ruleset);
        }
    }

    /// Replace the active rule set with `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] if two rules share an id; the
    /// previous rule set stays active.
    pub fn load_rules(
        &self,
        rules: impl IntoIterator<Item = ModerationRule>,
    ) -> Result<(), CompileError> {
        let ruleset = RuleSet::from_rules(rules)?;
        self.load(ruleset);
        Ok(())
    }

    /// Replace the active rule set with compiled definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DuplicateRuleId`] if two definitions share an id.
    pub fn load_definitions(&self, definitions: &[RuleDefinition]) -> Result<(), CompileError> {
        let ruleset = RuleSet::from_definitions(definitions)?;
        self.load(ruleset);
        Ok(())
    }

    /// Replace the active rule set with rules parsed from the DSL.
    ///
    /// # Errors
    ///
    /// Returns [`TermguardError`] on parse or compile failure; the previous
    /// rule set stays active.
    pub fn load_dsl(&self, input: &str) -> Result<(), TermguardError> {
        let ruleset = RuleSet::from_dsl(input)?;
        self.load(ruleset);
        Ok(())
    }

    /// The current snapshot. Holding it does not block reloads.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.inner.load_full()
    }

    /// Whether any active rule matches `text`.
    #[must_use]
    pub fn check(&self, text: &str) -> bool {
        self.inner.load().check(text)
    }

    /// Id of the first matching rule.
    #[must_use]
    pub fn matched_rule(&self, text: &str) -> Option<RuleId> {
        self.inner.load().matched_rule(text).map(|r| r.id)
    }

    /// Terms responsible for the matching rule; empty when nothing matches.
    #[must_use]
    pub fn hits(&self, text: &str) -> BTreeSet<String> {
        self.inner.load().hits(text)
    }

    /// The matching rule together with its hits.
    #[must_use]
    pub fn verdict(&self, text: &str) -> Option<Verdict> {
        self.inner.load().evaluate(text)
    }

    /// Number of active rules in the current snapshot.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.inner.load().len()
    }
}

impl fmt::Debug for Moderator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Moderator")
            .field("inner", &*self.inner.load())
            .finish()
    }
}
