use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::{RuleNode, write_quoted};
use super::options::MatchOptions;

/// Identifier of a moderation rule, as assigned by whatever stores the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RuleId {
    fn from(id: u64) -> Self {
        RuleId(id)
    }
}

/// A named, activatable rule with a compiled root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRule {
    pub id: RuleId,
    pub name: String,
    pub active: bool,
    pub root: RuleNode,
}

impl ModerationRule {
    /// An active rule.
    pub fn new(id: impl Into<RuleId>, name: impl Into<String>, root: RuleNode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            root,
        }
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders the rule in DSL form.
impl fmt::Display for ModerationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rule ")?;
        if is_plain_ident(&self.name) {
            f.write_str(&self.name)?;
        } else {
            write_quoted(f, &self.name)?;
        }
        write!(f, " (id {}", self.id)?;
        if !self.active {
            f.write_str(", inactive")?;
        }
        write!(f, "):\n    {}", self.root)
    }
}

/// A rule as stored by a persistence layer: one row with nullable,
/// op-dependent columns. Compiled into a [`ModerationRule`] by
/// [`RuleSet::from_definitions()`](super::RuleSet::from_definitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub node: NodeDefinition,
}

fn default_active() -> bool {
    true
}

/// One node of a stored rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<MatchOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeDefinition>>,
}

impl NodeDefinition {
    /// A bare node with only its op set.
    #[must_use]
    pub fn new(op: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            terms: None,
            min: None,
            options: None,
            children: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{all, any, not_any};

    #[test]
    fn rule_display_plain_name() {
        let rule = ModerationRule::new(3, "cars", any(["car"]));
        assert_eq!(rule.to_string(), "rule cars (id 3):\n    any(\"car\")");
    }

    #[test]
    fn rule_display_quoted_name_and_inactive() {
        let rule =
            ModerationRule::new(7, "Red cars", all(["car", "red"]).and(not_any(["sun"]))).inactive();
        assert_eq!(
            rule.to_string(),
            "rule \"Red cars\" (id 7, inactive):\n    all(\"car\", \"red\") and not_any(\"sun\")"
        );
    }

    #[test]
    fn definition_row_deserializes_with_nulls() {
        let json = r#"{
            "id": 5,
            "name": "cars",
            "op": "at_least",
            "terms": ["a", "b"],
            "min": 1,
            "options": null,
            "children": null
        }"#;
        let def: RuleDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.id, RuleId(5));
        assert!(def.active);
        assert_eq!(def.node.op, "at_least");
        assert_eq!(def.node.min, Some(1));
        assert_eq!(def.node.options, None);
        assert_eq!(def.node.children, None);
    }

    #[test]
    fn nested_definition_deserializes() {
        let json = r#"{
            "id": 1,
            "name": "combo",
            "active": false,
            "op": "and",
            "children": [
                {"op": "all", "terms": ["car"], "options": {"whole_word": false}},
                {"op": "not_any", "terms": ["sun"]}
            ]
        }"#;
        let def: RuleDefinition = serde_json::from_str(json).unwrap();
        assert!(!def.active);
        let children = def.node.children.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0].options,
            Some(MatchOptions {
                case_sensitive: false,
                whole_word: false,
            })
        );
    }
}
