use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use super::error::NodeDefect;
use super::options::MatchOptions;

/// The six operators a rule tree is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Any,
    All,
    NotAny,
    AtLeast,
    And,
    Or,
}

impl Op {
    /// Resolve an op name as stored in rule definitions. Case-insensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Op> {
        match name.trim().to_ascii_lowercase().as_str() {
            "any" => Some(Op::Any),
            "all" => Some(Op::All),
            "not_any" => Some(Op::NotAny),
            "at_least" => Some(Op::AtLeast),
            "and" => Some(Op::And),
            "or" => Some(Op::Or),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Any => "any",
            Op::All => "all",
            Op::NotAny => "not_any",
            Op::AtLeast => "at_least",
            Op::And => "and",
            Op::Or => "or",
        }
    }

    /// Whether this op composes terms (as opposed to child nodes).
    #[must_use]
    pub fn is_leaf(self) -> bool {
        matches!(self, Op::Any | Op::All | Op::NotAny | Op::AtLeast)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled boolean expression over literal terms.
///
/// Leaf variants (`Any`, `All`, `NotAny`, `AtLeast`) carry terms and their own
/// [`MatchOptions`]; `And`/`Or` carry child nodes. `Malformed` stands in for a
/// definition that could not be compiled and never matches, nor does any
/// node whose shape is invalid (see [`RuleNode::defects()`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleNode {
    Any {
        terms: Vec<String>,
        options: MatchOptions,
    },
    All {
        terms: Vec<String>,
        options: MatchOptions,
    },
    NotAny {
        terms: Vec<String>,
        options: MatchOptions,
    },
    AtLeast {
        min: usize,
        terms: Vec<String>,
        options: MatchOptions,
    },
    And(Vec<RuleNode>),
    Or(Vec<RuleNode>),
    Malformed {
        defect: NodeDefect,
    },
}

/// Result of evaluating a node against a text: whether it matched and which
/// literal terms were responsible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct Outcome {
    pub matched: bool,
    pub hits: BTreeSet<String>,
}

impl Outcome {
    pub(crate) fn miss() -> Self {
        Self::default()
    }

    pub(crate) fn hit(hits: BTreeSet<String>) -> Self {
        Self {
            matched: true,
            hits,
        }
    }
}

impl RuleNode {
    /// The node's operator, or `None` for a malformed node.
    #[must_use]
    pub fn op(&self) -> Option<Op> {
        match self {
            RuleNode::Any { .. } => Some(Op::Any),
            RuleNode::All { .. } => Some(Op::All),
            RuleNode::NotAny { .. } => Some(Op::NotAny),
            RuleNode::AtLeast { .. } => Some(Op::AtLeast),
            RuleNode::And(_) => Some(Op::And),
            RuleNode::Or(_) => Some(Op::Or),
            RuleNode::Malformed { .. } => None,
        }
    }

    /// Terms of a leaf node; empty for composites.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        match self {
            RuleNode::Any { terms, .. }
            | RuleNode::All { terms, .. }
            | RuleNode::NotAny { terms, .. }
            | RuleNode::AtLeast { terms, .. } => terms,
            _ => &[],
        }
    }

    /// Match options of a leaf node.
    #[must_use]
    pub fn options(&self) -> Option<MatchOptions> {
        match self {
            RuleNode::Any { options, .. }
            | RuleNode::All { options, .. }
            | RuleNode::NotAny { options, .. }
            | RuleNode::AtLeast { options, .. } => Some(*options),
            _ => None,
        }
    }

    /// Children of an `And`/`Or` node; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[RuleNode] {
        match self {
            RuleNode::And(children) | RuleNode::Or(children) => children,
            _ => &[],
        }
    }

    /// Boolean evaluation. Short-circuits and collects no hits.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        crate::evaluate::node_matches(&self.strict(), &crate::matcher::PreparedText::new(text))
    }

    /// Full evaluation, collecting the terms that contributed to a match.
    pub fn evaluate(&self, text: &str) -> Outcome {
        crate::evaluate::evaluate_node(&self.strict(), &crate::matcher::PreparedText::new(text))
    }

    /// Replace every node with an invalid shape by [`RuleNode::Malformed`].
    ///
    /// The evaluator relies on this: it treats `Malformed` as a miss and
    /// otherwise takes every variant at face value.
    pub(crate) fn into_strict(self) -> RuleNode {
        if let Some(defect) = self.defect() {
            return RuleNode::Malformed { defect };
        }
        match self {
            RuleNode::And(children) => {
                RuleNode::And(children.into_iter().map(RuleNode::into_strict).collect())
            }
            RuleNode::Or(children) => {
                RuleNode::Or(children.into_iter().map(RuleNode::into_strict).collect())
            }
            node => node,
        }
    }

    /// Whether [`into_strict`](Self::into_strict) would leave this tree unchanged.
    pub(crate) fn is_strict(&self) -> bool {
        matches!(self, RuleNode::Malformed { .. })
            || (self.defect().is_none() && self.children().iter().all(RuleNode::is_strict))
    }

    fn strict(&self) -> Cow<'_, RuleNode> {
        if self.is_strict() {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.clone().into_strict())
        }
    }

    /// Every shape problem in this subtree, in depth-first order.
    #[must_use]
    pub fn defects(&self) -> Vec<NodeDefect> {
        let mut out = Vec::new();
        collect_defects(self, &mut out);
        out
    }

    /// Whether this node alone (ignoring its children) is well formed.
    pub(crate) fn defect(&self) -> Option<NodeDefect> {
        match self {
            RuleNode::Malformed { defect } => Some(defect.clone()),
            RuleNode::Any { terms, .. }
            | RuleNode::All { terms, .. }
            | RuleNode::NotAny { terms, .. } => terms_defect(self.op_name(), terms),
            RuleNode::AtLeast { min, terms, .. } => {
                terms_defect(self.op_name(), terms).or_else(|| {
                    (*min == 0 || *min > terms.len()).then(|| NodeDefect::MinOutOfRange {
                        min: i64::try_from(*min).unwrap_or(i64::MAX),
                        len: terms.len(),
                    })
                })
            }
            RuleNode::And(children) | RuleNode::Or(children) => {
                children.is_empty().then(|| NodeDefect::MissingChildren {
                    op: self.op_name().to_owned(),
                })
            }
        }
    }

    fn op_name(&self) -> &'static str {
        self.op().map_or("malformed", Op::as_str)
    }

    /// Replace the match options of a leaf node. Composites are returned unchanged.
    #[must_use]
    pub fn with_options(mut self, new: MatchOptions) -> Self {
        match &mut self {
            RuleNode::Any { options, .. }
            | RuleNode::All { options, .. }
            | RuleNode::NotAny { options, .. }
            | RuleNode::AtLeast { options, .. } => *options = new,
            _ => {}
        }
        self
    }

    /// Match terms case-sensitively.
    #[must_use]
    pub fn case_sensitive(self) -> Self {
        let opts = self.options().unwrap_or_default().case_sensitive(true);
        self.with_options(opts)
    }

    /// Match terms as plain substrings instead of whole words.
    #[must_use]
    pub fn substring(self) -> Self {
        let opts = self.options().unwrap_or_default().whole_word(false);
        self.with_options(opts)
    }

    /// Combine with `other` under `And`, extending an existing `And` in place.
    #[must_use]
    pub fn and(self, other: RuleNode) -> RuleNode {
        match self {
            RuleNode::And(mut children) => {
                children.push(other);
                RuleNode::And(children)
            }
            node => RuleNode::And(vec![node, other]),
        }
    }

    /// Combine with `other` under `Or`, extending an existing `Or` in place.
    #[must_use]
    pub fn or(self, other: RuleNode) -> RuleNode {
        match self {
            RuleNode::Or(mut children) => {
                children.push(other);
                RuleNode::Or(children)
            }
            node => RuleNode::Or(vec![node, other]),
        }
    }
}

fn terms_defect(op: &str, terms: &[String]) -> Option<NodeDefect> {
    if terms.is_empty() {
        return Some(NodeDefect::MissingTerms { op: op.to_owned() });
    }
    if terms.iter().any(|t| crate::matcher::is_blank_term(t)) {
        return Some(NodeDefect::EmptyTerm { op: op.to_owned() });
    }
    None
}

fn collect_defects(node: &RuleNode, out: &mut Vec<NodeDefect>) {
    if let Some(defect) = node.defect() {
        out.push(defect);
    }
    for child in node.children() {
        collect_defects(child, out);
    }
}

fn collect_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    terms.into_iter().map(Into::into).collect()
}

/// Matches when at least one term is present.
#[must_use]
pub fn any<I, S>(terms: I) -> RuleNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RuleNode::Any {
        terms: collect_terms(terms),
        options: MatchOptions::default(),
    }
}

/// Matches when every term is present.
#[must_use]
pub fn all<I, S>(terms: I) -> RuleNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RuleNode::All {
        terms: collect_terms(terms),
        options: MatchOptions::default(),
    }
}

/// Matches when none of the terms is present.
#[must_use]
pub fn not_any<I, S>(terms: I) -> RuleNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RuleNode::NotAny {
        terms: collect_terms(terms),
        options: MatchOptions::default(),
    }
}

/// Matches when at least `min` of the terms are present.
#[must_use]
pub fn at_least<I, S>(min: usize, terms: I) -> RuleNode
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RuleNode::AtLeast {
        min,
        terms: collect_terms(terms),
        options: MatchOptions::default(),
    }
}

/// Matches when every child matches.
#[must_use]
pub fn and(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::And(children.into_iter().collect())
}

/// Matches when at least one child matches.
#[must_use]
pub fn or(children: impl IntoIterator<Item = RuleNode>) -> RuleNode {
    RuleNode::Or(children.into_iter().collect())
}

// -- DSL rendering ----------------------------------------------------------

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_leaf(
    f: &mut fmt::Formatter<'_>,
    op: Op,
    min: Option<usize>,
    terms: &[String],
    options: MatchOptions,
) -> fmt::Result {
    write!(f, "{op}(")?;
    if let Some(min) = min {
        write!(f, "{min}")?;
        if !terms.is_empty() {
            f.write_str(", ")?;
        }
    }
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_quoted(f, term)?;
    }
    f.write_str(")")?;
    if !options.is_default() {
        write!(f, " {options}")?;
    }
    Ok(())
}

fn write_composite(f: &mut fmt::Formatter<'_>, op: Op, children: &[RuleNode]) -> fmt::Result {
    if children.is_empty() {
        return write!(f, "{op}()");
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        if child.children().is_empty() {
            write!(f, "{child}")?;
        } else {
            write!(f, "({child})")?;
        }
    }
    Ok(())
}

/// Renders the node in DSL syntax.
///
/// Well-formed trees parse back to an equivalent node. Malformed nodes and
/// composites without children render as `<malformed: ...>`, `and()` and
/// `or()`, which the parser rejects.
impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleNode::Any { terms, options } => write_leaf(f, Op::Any, None, terms, *options),
            RuleNode::All { terms, options } => write_leaf(f, Op::All, None, terms, *options),
            RuleNode::NotAny { terms, options } => {
                write_leaf(f, Op::NotAny, None, terms, *options)
            }
            RuleNode::AtLeast {
                min,
                terms,
                options,
            } => write_leaf(f, Op::AtLeast, Some(*min), terms, *options),
            RuleNode::And(children) => write_composite(f, Op::And, children),
            RuleNode::Or(children) => write_composite(f, Op::Or, children),
            RuleNode::Malformed { defect } => write!(f, "<malformed: {defect}>"),
        }
    }
}
