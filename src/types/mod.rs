mod error;
mod evaluation_report;
mod node;
mod options;
mod rule;
mod ruleset;
mod verdict;

pub use error::{CompileError, NodeDefect};
pub use evaluation_report::EvaluationReport;
pub use node::{Op, Outcome, RuleNode, all, and, any, at_least, not_any, or};
pub use options::MatchOptions;
pub use rule::{ModerationRule, NodeDefinition, RuleDefinition, RuleId};
pub use ruleset::{RuleBuilder, RuleDefect, RuleSet, RuleSetBuilder};
pub(crate) use ruleset::PendingRule;
pub use verdict::{FlagRecord, Verdict};
