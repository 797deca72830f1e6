use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RuleId;

/// Errors raised when assembling a [`RuleSet`](super::RuleSet) from rules.
///
/// These cover misuse of the builder only. Problems inside a rule tree are
/// reported as [`NodeDefect`]s and never fail compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate rule id {id} ('{first}' and '{second}')")]
    DuplicateRuleId {
        id: RuleId,
        first: String,
        second: String,
    },

    #[error("rule '{rule}' has no condition; call .when() in the rule definition")]
    MissingCondition { rule: String },

    #[error("rule '{rule}' has no id; call .id() in the rule definition")]
    MissingId { rule: String },
}

/// A shape problem in a rule tree. Nodes carrying a defect never match.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NodeDefect {
    #[error("unknown op '{op}'")]
    UnknownOp { op: String },

    #[error("'{op}' node has no terms")]
    MissingTerms { op: String },

    #[error("'{op}' node contains an empty term")]
    EmptyTerm { op: String },

    #[error("'{op}' node has no children")]
    MissingChildren { op: String },

    #[error("'{op}' node must not carry children")]
    UnexpectedChildren { op: String },

    #[error("'{op}' node must not carry terms")]
    UnexpectedTerms { op: String },

    #[error("'at_least' node has no min")]
    MissingMin,

    #[error("'at_least' min {min} out of range 1..={len}")]
    MinOutOfRange { min: i64, len: usize },
}
