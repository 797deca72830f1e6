#![cfg(kani)]
//! Kani proof harnesses for the termguard evaluation model.
//!
//! These harnesses verify core invariants of the rule scan using a model that
//! mirrors the semantics of `RuleSet::evaluate` without `String`s, text
//! normalization, or recursive trees.
//!
//! Model:
//! - Term lookups are abstracted away: `present[t]` says whether term `t`
//!   occurs in the text.
//! - Each rule is a single leaf over the terms `0..rule_len[i]`, with a kind
//!   (0 = any, 1 = all, 2 = not_any, 3 = at_least) and a `min` for `at_least`.
//! - A leaf with no terms, or an `at_least` whose `min` is outside
//!   `1..=len`, is malformed and never matches.
//! - Rules are scanned in index order (already sorted by name); inactive rules
//!   are skipped and the first matching rule wins.
//!
//! Run with: `cargo kani --tests --harness <harness_name>`

/// Maximum number of rules / terms for bounded proofs.
const MAX_N: usize = 6;

fn count_present(len: usize, present: &[bool; MAX_N]) -> usize {
    let mut count = 0;
    let mut t = 0;
    while t < len {
        if present[t] {
            count += 1;
        }
        t += 1;
    }
    count
}

fn is_malformed(kind: u8, len: usize, min: usize) -> bool {
    len == 0 || (kind == 3 && (min == 0 || min > len))
}

/// Evaluate one leaf. Malformed leaves fail closed.
fn model_leaf(kind: u8, len: usize, min: usize, present: &[bool; MAX_N]) -> bool {
    if is_malformed(kind, len, min) {
        return false;
    }
    let found = count_present(len, present);
    match kind {
        0 => found > 0,
        1 => found == len,
        2 => found == 0,
        _ => found >= min,
    }
}

/// Scan rules in order and return the index of the first active rule whose
/// leaf matches, or `None`.
fn model_evaluate(
    n_rules: usize,
    rule_kind: &[u8; MAX_N],
    rule_len: &[usize; MAX_N],
    rule_min: &[usize; MAX_N],
    rule_active: &[bool; MAX_N],
    present: &[bool; MAX_N],
) -> (Option<usize>, [bool; MAX_N]) {
    let mut results = [false; MAX_N];
    let mut winner = None;

    let mut i: usize = 0;
    while i < n_rules {
        results[i] = model_leaf(rule_kind[i], rule_len[i], rule_min[i], present);
        if winner.is_none() && rule_active[i] && results[i] {
            winner = Some(i);
        }
        i += 1;
    }

    (winner, results)
}

fn any_rules() -> (usize, [u8; MAX_N], [usize; MAX_N], [usize; MAX_N], [bool; MAX_N]) {
    let n_rules: usize = kani::any();
    kani::assume(n_rules >= 1 && n_rules <= MAX_N);

    let rule_kind: [u8; MAX_N] = kani::any();
    let rule_len: [usize; MAX_N] = kani::any();
    let rule_min: [usize; MAX_N] = kani::any();
    let rule_active: [bool; MAX_N] = kani::any();

    let mut i: usize = 0;
    while i < n_rules {
        kani::assume(rule_kind[i] < 4);
        kani::assume(rule_len[i] <= MAX_N);
        i += 1;
    }

    (n_rules, rule_kind, rule_len, rule_min, rule_active)
}

// ---------------------------------------------------------------------------
// Proof 1: Panic freedom
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(8)]
fn panic_freedom() {
    let (n_rules, kind, len, min, active) = any_rules();
    let present: [bool; MAX_N] = kani::any();
    let _ = model_evaluate(n_rules, &kind, &len, &min, &active, &present);
}

// ---------------------------------------------------------------------------
// Proof 2: Determinism
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(8)]
fn determinism() {
    let (n_rules, kind, len, min, active) = any_rules();
    let present: [bool; MAX_N] = kani::any();

    let (w1, r1) = model_evaluate(n_rules, &kind, &len, &min, &active, &present);
    let (w2, r2) = model_evaluate(n_rules, &kind, &len, &min, &active, &present);

    kani::assert(w1 == w2, "winner must match");
    let mut k: usize = 0;
    while k < n_rules {
        kani::assert(r1[k] == r2[k], "rule results must match");
        k += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 3: First match wins
//
// The winner is active and matches; no earlier active rule matches. Without a
// winner, no active rule matches.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(8)]
fn first_match_wins() {
    let (n_rules, kind, len, min, active) = any_rules();
    let present: [bool; MAX_N] = kani::any();

    let (winner, results) = model_evaluate(n_rules, &kind, &len, &min, &active, &present);

    let limit = winner.unwrap_or(n_rules);
    if let Some(w) = winner {
        kani::assert(w < n_rules, "winner out of range");
        kani::assert(active[w], "inactive rule won");
        kani::assert(results[w], "winner did not match");
    }
    let mut i: usize = 0;
    while i < limit {
        kani::assert(!(active[i] && results[i]), "earlier active rule matched");
        i += 1;
    }
}

// ---------------------------------------------------------------------------
// Proof 4: Fail closed
//
// A malformed leaf never matches, whatever the text contains.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(8)]
fn malformed_leaves_never_match() {
    let kind: u8 = kani::any();
    kani::assume(kind < 4);
    let len: usize = kani::any();
    kani::assume(len <= MAX_N);
    let min: usize = kani::any();
    let present: [bool; MAX_N] = kani::any();

    kani::assume(is_malformed(kind, len, min));
    kani::assert(!model_leaf(kind, len, min, &present), "malformed leaf matched");
}

// ---------------------------------------------------------------------------
// Proof 5: Leaf relationships
//
// For well-formed term lists, not_any is the complement of any, and at_least
// agrees with any at min 1 and with all at min len.
// ---------------------------------------------------------------------------

#[kani::proof]
#[kani::unwind(8)]
fn leaf_relationships() {
    let len: usize = kani::any();
    kani::assume(len >= 1 && len <= MAX_N);
    let present: [bool; MAX_N] = kani::any();

    let any = model_leaf(0, len, 0, &present);
    let all = model_leaf(1, len, 0, &present);
    let not_any = model_leaf(2, len, 0, &present);

    kani::assert(any != not_any, "not_any is not the complement of any");
    kani::assert(model_leaf(3, len, 1, &present) == any, "at_least(1) differs from any");
    kani::assert(model_leaf(3, len, len, &present) == all, "at_least(len) differs from all");
    kani::assert(!all || any, "all without any");
}
