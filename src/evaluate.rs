use std::collections::BTreeSet;
use std::time::Instant;

use crate::matcher::PreparedText;
use crate::types::{EvaluationReport, MatchOptions, ModerationRule, Outcome, RuleNode, Verdict};

/// Boolean evaluation with short-circuiting over a strict tree (see
/// [`RuleNode::into_strict`]). `Malformed` never matches.
pub(crate) fn node_matches(node: &RuleNode, text: &PreparedText) -> bool {
    match node {
        RuleNode::Any { terms, options } => terms.iter().any(|t| text.contains(t, *options)),
        RuleNode::All { terms, options } => terms.iter().all(|t| text.contains(t, *options)),
        RuleNode::NotAny { terms, options } => !terms.iter().any(|t| text.contains(t, *options)),
        RuleNode::AtLeast {
            min,
            terms,
            options,
        } => {
            let mut found = 0;
            for term in terms {
                if text.contains(term, *options) {
                    found += 1;
                    if found >= *min {
                        return true;
                    }
                }
            }
            false
        }
        RuleNode::And(children) => children.iter().all(|c| node_matches(c, text)),
        RuleNode::Or(children) => children.iter().any(|c| node_matches(c, text)),
        RuleNode::Malformed { .. } => false,
    }
}

/// Full evaluation. Every child of an `Or` is visited so that hits from all
/// matching branches are reported; branches that did not match contribute
/// nothing. A passing `NotAny` contributes no hits. Expects a strict tree.
pub(crate) fn evaluate_node(node: &RuleNode, text: &PreparedText) -> Outcome {
    match node {
        RuleNode::Any { terms, options } => {
            let present = present_terms(terms, *options, text);
            if present.is_empty() {
                Outcome::miss()
            } else {
                Outcome::hit(present)
            }
        }
        RuleNode::All { terms, options } => {
            if terms.iter().all(|t| text.contains(t, *options)) {
                Outcome::hit(terms.iter().cloned().collect())
            } else {
                Outcome::miss()
            }
        }
        RuleNode::NotAny { terms, options } => {
            if terms.iter().any(|t| text.contains(t, *options)) {
                Outcome::miss()
            } else {
                Outcome::hit(BTreeSet::new())
            }
        }
        RuleNode::AtLeast {
            min,
            terms,
            options,
        } => {
            let mut count = 0;
            let mut present = BTreeSet::new();
            for term in terms {
                if text.contains(term, *options) {
                    count += 1;
                    present.insert(term.clone());
                }
            }
            if count >= *min {
                Outcome::hit(present)
            } else {
                Outcome::miss()
            }
        }
        RuleNode::And(children) => {
            let mut hits = BTreeSet::new();
            for child in children {
                let outcome = evaluate_node(child, text);
                if !outcome.matched {
                    return Outcome::miss();
                }
                hits.extend(outcome.hits);
            }
            Outcome::hit(hits)
        }
        RuleNode::Or(children) => {
            let mut matched = false;
            let mut hits = BTreeSet::new();
            for child in children {
                let outcome = evaluate_node(child, text);
                if outcome.matched {
                    matched = true;
                    hits.extend(outcome.hits);
                }
            }
            if matched {
                Outcome::hit(hits)
            } else {
                Outcome::miss()
            }
        }
        RuleNode::Malformed { .. } => Outcome::miss(),
    }
}

fn present_terms(terms: &[String], options: MatchOptions, text: &PreparedText) -> BTreeSet<String> {
    terms
        .iter()
        .filter(|t| text.contains(t, options))
        .cloned()
        .collect()
}

/// Index of the first rule (in scan order) whose root matches.
pub(crate) fn first_match(rules: &[ModerationRule], text: &PreparedText) -> Option<usize> {
    rules.iter().position(|r| node_matches(&r.root, text))
}

/// First-match-wins scan returning the winning rule and its hits.
pub(crate) fn evaluate(rules: &[ModerationRule], text: &str) -> Option<Verdict> {
    let prepared = PreparedText::new(text);
    let idx = first_match(rules, &prepared)?;
    Some(verdict_for(&rules[idx], &prepared))
}

pub(crate) fn evaluate_detailed(rules: &[ModerationRule], text: &str) -> EvaluationReport {
    let start = Instant::now();
    let prepared = PreparedText::new(text);

    let mut considered = Vec::new();
    let mut verdict = None;
    for rule in rules {
        considered.push(rule.name.clone());
        if node_matches(&rule.root, &prepared) {
            verdict = Some(verdict_for(rule, &prepared));
            break;
        }
    }

    EvaluationReport::new(verdict, considered, start.elapsed())
}

fn verdict_for(rule: &ModerationRule, text: &PreparedText) -> Verdict {
    let outcome = evaluate_node(&rule.root, text);
    Verdict::new(rule.id, &rule.name, rule.root.options(), outcome.hits)
}
