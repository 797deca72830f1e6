use winnow::ascii::{dec_uint, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{MatchOptions, ModerationRule, Op, RuleId, RuleNode};

use super::parser::ParsedRuleSet;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & literals -------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn term(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    string_literal
        .context(StrContext::Expected(StrContextValue::Description(
            "quoted term",
        )))
        .parse_next(input)
}

/// A keyword that is not the prefix of a longer identifier.
fn keyword<'i>(word: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    ident.verify(move |found: &str| found.eq_ignore_ascii_case(word))
}

// -- Leaves -----------------------------------------------------------------

fn leaf_op(input: &mut &str) -> ModalResult<Op> {
    ident
        .verify_map(|name: &str| Op::from_name(name).filter(|op| op.is_leaf()))
        .parse_next(input)
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    CaseSensitive,
    CaseInsensitive,
    WholeWord,
    Substring,
}

impl Flag {
    fn apply(self, options: MatchOptions) -> MatchOptions {
        match self {
            Flag::CaseSensitive => options.case_sensitive(true),
            Flag::CaseInsensitive => options.case_sensitive(false),
            Flag::WholeWord => options.whole_word(true),
            Flag::Substring => options.whole_word(false),
        }
    }
}

fn option_flag(input: &mut &str) -> ModalResult<Flag> {
    ws.parse_next(input)?;
    alt((
        keyword("case_sensitive").value(Flag::CaseSensitive),
        keyword("case_insensitive").value(Flag::CaseInsensitive),
        keyword("whole_word").value(Flag::WholeWord),
        keyword("substring").value(Flag::Substring),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "option flag",
    )))
    .parse_next(input)
}

fn options(input: &mut &str) -> ModalResult<MatchOptions> {
    let flags: Vec<Flag> = delimited(
        (ws, '['),
        cut_err(separated(1.., option_flag, (ws, ','))),
        (ws, cut_err(']')),
    )
    .parse_next(input)?;
    Ok(flags
        .into_iter()
        .fold(MatchOptions::default(), |opts, flag| flag.apply(opts)))
}

fn leaf(input: &mut &str) -> ModalResult<RuleNode> {
    let op = leaf_op.parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('(').parse_next(input)?;

    let min = if op == Op::AtLeast {
        ws.parse_next(input)?;
        let n: u64 = cut_err(dec_uint::<_, u64, _>)
            .context(StrContext::Expected(StrContextValue::Description(
                "minimum count",
            )))
            .parse_next(input)?;
        cut_err((ws, ',')).parse_next(input)?;
        Some(usize::try_from(n).map_err(|_| ErrMode::Cut(ContextError::new()))?)
    } else {
        None
    };

    let terms: Vec<String> = cut_err(separated(1.., term, (ws, ','))).parse_next(input)?;
    cut_err((ws, ')')).parse_next(input)?;
    let options = opt(options).parse_next(input)?.unwrap_or_default();

    Ok(match op {
        Op::Any => RuleNode::Any { terms, options },
        Op::All => RuleNode::All { terms, options },
        Op::NotAny => RuleNode::NotAny { terms, options },
        _ => RuleNode::AtLeast {
            min: min.unwrap_or_default(),
            terms,
            options,
        },
    })
}

// -- Expressions (precedence: OR < AND < primary) ---------------------------

fn primary(input: &mut &str) -> ModalResult<RuleNode> {
    ws.parse_next(input)?;
    alt((delimited('(', expr, (ws, cut_err(')'))), leaf))
        .context(StrContext::Expected(StrContextValue::Description(
            "expression",
        )))
        .parse_next(input)
}

fn fold_chain(first: RuleNode, rest: Vec<RuleNode>, op: Op) -> RuleNode {
    if rest.is_empty() {
        return first;
    }
    let mut children = Vec::with_capacity(rest.len() + 1);
    children.push(first);
    children.extend(rest);
    if op == Op::And {
        RuleNode::And(children)
    } else {
        RuleNode::Or(children)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<RuleNode> {
    let first = primary(input)?;
    let rest: Vec<RuleNode> =
        repeat(0.., preceded((ws, keyword("and")), cut_err(primary))).parse_next(input)?;
    Ok(fold_chain(first, rest, Op::And))
}

fn or_expr(input: &mut &str) -> ModalResult<RuleNode> {
    let first = and_expr(input)?;
    let rest: Vec<RuleNode> =
        repeat(0.., preceded((ws, keyword("or")), cut_err(and_expr))).parse_next(input)?;
    Ok(fold_chain(first, rest, Op::Or))
}

fn expr(input: &mut &str) -> ModalResult<RuleNode> {
    ws.parse_next(input)?;
    or_expr(input)
}

// -- Rule definitions -------------------------------------------------------

fn rule_name(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, ident.map(str::to_owned))).parse_next(input)
}

#[derive(Debug, Clone, Copy)]
enum Attribute {
    Id(u64),
    Inactive,
}

fn attribute(input: &mut &str) -> ModalResult<Attribute> {
    ws.parse_next(input)?;
    alt((
        preceded((keyword("id"), ws), cut_err(dec_uint::<_, u64, _>)).map(Attribute::Id),
        keyword("inactive").value(Attribute::Inactive),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "rule attribute",
    )))
    .parse_next(input)
}

fn rule_def(input: &mut &str) -> ModalResult<ModerationRule> {
    ws.parse_next(input)?;
    keyword("rule").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(rule_name)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    let attrs: Vec<Attribute> = delimited(
        (ws, cut_err('(')),
        cut_err(separated(1.., attribute, (ws, ','))),
        (ws, cut_err(')')),
    )
    .parse_next(input)?;

    let mut id = None;
    let mut active = true;
    for attr in attrs {
        match attr {
            Attribute::Id(n) => id = Some(RuleId(n)),
            Attribute::Inactive => active = false,
        }
    }
    let id = id.ok_or_else(|| {
        let mut err = ContextError::new();
        err.push(StrContext::Expected(StrContextValue::Description(
            "rule id",
        )));
        ErrMode::Cut(err)
    })?;

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let root = cut_err(expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule body",
        )))
        .parse_next(input)?;

    Ok(ModerationRule {
        id,
        name,
        active,
        root,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_ruleset(input: &mut &str) -> ModalResult<ParsedRuleSet> {
    let rules: Vec<ModerationRule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedRuleSet { rules })
}
