//! Rule-based text moderation.
//!
//! Rules are boolean trees over literal terms (`any`, `all`, `not_any`,
//! `at_least`, combined with `and`/`or`). A [`RuleSet`] scans its active
//! rules in name order and reports the first one that matches a text, along
//! with the terms responsible. [`Moderator`] wraps a rule set that can be
//! swapped atomically while other threads keep checking texts.
//!
//! ```
//! use termguard::{Moderator, ModerationRule, all, not_any};
//!
//! let moderator = Moderator::new();
//! moderator.load_rule(ModerationRule::new(
//!     1,
//!     "red_cars",
//!     all(["car", "red"]).and(not_any(["sun"])),
//! ));
//!
//! assert!(moderator.check("A red car by the sea"));
//! assert!(!moderator.check("A red car under the sun"));
//! ```

mod compile;
mod error;
mod evaluate;
mod matcher;
mod moderator;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use error::TermguardError;
pub use matcher::term_present;
pub use moderator::Moderator;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    CompileError, EvaluationReport, FlagRecord, MatchOptions, ModerationRule, NodeDefect,
    NodeDefinition, Op, Outcome, RuleBuilder, RuleDefect, RuleDefinition, RuleId, RuleNode,
    RuleSet, RuleSetBuilder, Verdict, all, and, any, at_least, not_any, or,
};
