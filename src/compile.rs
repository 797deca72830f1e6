use std::collections::HashMap;

use crate::types::PendingRule;
use crate::{
    CompileError, ModerationRule, NodeDefect, NodeDefinition, Op, RuleDefect, RuleDefinition,
    RuleId, RuleNode, RuleSet,
};

pub(crate) fn compile_pending(rules: Vec<PendingRule>) -> Result<RuleSet, CompileError> {
    let rules = rules
        .into_iter()
        .map(|pending| {
            let Some(id) = pending.id else {
                return Err(CompileError::MissingId { rule: pending.name });
            };
            let Some(root) = pending.condition else {
                return Err(CompileError::MissingCondition { rule: pending.name });
            };
            Ok(ModerationRule {
                id,
                name: pending.name,
                active: pending.active,
                root,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    compile(rules)
}

pub(crate) fn compile(rules: Vec<ModerationRule>) -> Result<RuleSet, CompileError> {
    check_duplicates(&rules)?;

    let total = rules.len();
    let mut active: Vec<ModerationRule> = rules
        .into_iter()
        .filter(|r| r.active)
        .map(|rule| ModerationRule {
            root: rule.root.into_strict(),
            ..rule
        })
        .collect();
    // Stable: rules sharing a name keep their input order. Names compare
    // byte-wise, so "Zebra" sorts before "apple".
    active.sort_by(|a, b| a.name.cmp(&b.name));

    let defects = active
        .iter()
        .flat_map(|rule| {
            rule.root.defects().into_iter().map(|defect| RuleDefect {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                defect,
            })
        })
        .collect();

    Ok(RuleSet {
        inactive: total - active.len(),
        rules: active,
        defects,
        #[cfg(feature = "binary-cache")]
        source_digest: None,
    })
}

fn check_duplicates(rules: &[ModerationRule]) -> Result<(), CompileError> {
    let mut seen: HashMap<RuleId, &str> = HashMap::new();
    for rule in rules {
        if let Some(first) = seen.insert(rule.id, &rule.name) {
            return Err(CompileError::DuplicateRuleId {
                id: rule.id,
                first: first.to_owned(),
                second: rule.name.clone(),
            });
        }
    }
    Ok(())
}

pub(crate) fn compile_definition(def: &RuleDefinition) -> ModerationRule {
    ModerationRule {
        id: def.id,
        name: def.name.clone(),
        active: def.active,
        root: compile_node(&def.node),
    }
}

/// Turn a stored node into a strict variant. Anything that does not fit its
/// op becomes [`RuleNode::Malformed`].
pub(crate) fn compile_node(def: &NodeDefinition) -> RuleNode {
    match leaf_or_composite(def) {
        Ok(node) => node,
        Err(defect) => RuleNode::Malformed { defect },
    }
}

fn leaf_or_composite(def: &NodeDefinition) -> Result<RuleNode, NodeDefect> {
    let op = Op::from_name(&def.op).ok_or_else(|| NodeDefect::UnknownOp { op: def.op.clone() })?;
    let name = op.as_str().to_owned();

    let terms = def.terms.as_deref().unwrap_or_default();
    let children = def.children.as_deref().unwrap_or_default();

    if op.is_leaf() {
        if !children.is_empty() {
            return Err(NodeDefect::UnexpectedChildren { op: name });
        }
        if terms.is_empty() {
            return Err(NodeDefect::MissingTerms { op: name });
        }
        if terms.iter().any(|t| crate::matcher::is_blank_term(t)) {
            return Err(NodeDefect::EmptyTerm { op: name });
        }
    } else {
        if !terms.is_empty() {
            return Err(NodeDefect::UnexpectedTerms { op: name });
        }
        if children.is_empty() {
            return Err(NodeDefect::MissingChildren { op: name });
        }
    }

    let terms = terms.to_vec();
    let options = def.options.unwrap_or_default();

    Ok(match op {
        Op::Any => RuleNode::Any { terms, options },
        Op::All => RuleNode::All { terms, options },
        Op::NotAny => RuleNode::NotAny { terms, options },
        Op::AtLeast => {
            let min = def.min.ok_or(NodeDefect::MissingMin)?;
            let in_range = usize::try_from(min)
                .ok()
                .filter(|m| (1..=terms.len()).contains(m));
            let Some(min) = in_range else {
                return Err(NodeDefect::MinOutOfRange {
                    min,
                    len: terms.len(),
                });
            };
            RuleNode::AtLeast {
                min,
                terms,
                options,
            }
        }
        Op::And => RuleNode::And(children.iter().map(compile_node).collect()),
        Op::Or => RuleNode::Or(children.iter().map(compile_node).collect()),
    })
}
