use crate::ModerationRule;

/// The result of parsing a DSL input string.
#[derive(Debug)]
pub struct ParsedRuleSet {
    pub rules: Vec<ModerationRule>,
}
