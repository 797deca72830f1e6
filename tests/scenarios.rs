use std::collections::BTreeSet;

use termguard::{
    MatchOptions, ModerationRule, RuleId, RuleSet, RuleSetBuilder, all, and, any, at_least,
    not_any, term_present,
};

fn hits(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ---------------------------------------------------------------------------
// Worked examples
// ---------------------------------------------------------------------------

#[test]
fn any_single_term() {
    assert!(any(["car"]).matches("This is a car"));
}

#[test]
fn all_terms_required() {
    let node = all(["car", "red", "fast"]);
    assert!(node.matches("A red fast car zooms by"));
    assert!(!node.matches("A red car is slow"));
}

#[test]
fn all_with_forbidden_terms() {
    let node = and([all(["car", "red", "fast"]), not_any(["sun"])]);
    assert!(node.matches("red fast car by the sea"));
    assert!(!node.matches("red fast car under the sun"));
}

#[test]
fn whole_word_rejects_embedded_terms() {
    let node = any(["car"]).with_options(MatchOptions::new().whole_word(true));
    assert!(!node.matches("a scar on the arm"));
    assert!(!node.matches("Watching nascar tonight"));
    assert!(node.matches("Look (car) here"));
}

#[test]
fn at_least_combined_with_any() {
    let node = and([
        at_least(3, ["car", "red", "fast", "sun", "sea", "beach"]),
        any(["demo", "garage", "house"]),
    ]);
    assert!(node.matches("red fast car near a garage by the sea"));
    assert!(!node.matches("red car parked at home"));

    let outcome = node.evaluate("red fast car near a garage by the sea");
    assert!(outcome.matched);
    assert_eq!(outcome.hits, hits(&["car", "fast", "garage", "red", "sea"]));
}

#[test]
fn phrase_terms_break_on_hyphen() {
    let node = any(["red car"]);
    assert!(node.matches("lovely red car on display"));
    assert!(!node.matches("lovely red-car on display"));
}

// ---------------------------------------------------------------------------
// Term matching
// ---------------------------------------------------------------------------

#[test]
fn case_folding() {
    let default = MatchOptions::default();
    assert!(term_present("A RED Car", "red car", default));
    assert!(term_present("a red car", "RED CAR", default));

    let sensitive = MatchOptions::new().case_sensitive(true);
    assert!(!term_present("A RED Car", "red car", sensitive));
    assert!(term_present("A RED Car", "RED Car", sensitive));
}

#[test]
fn separators_normalize() {
    let default = MatchOptions::default();
    assert!(term_present("red_car", "red car", default));
    assert!(term_present("red   car", "red_car", default));
    assert!(term_present("red\t\ncar", "red car", default));
    assert!(term_present("a red car", "  red car  ", default));
}

#[test]
fn substring_mode() {
    let substring = MatchOptions::new().whole_word(false);
    assert!(term_present("a scar on the arm", "car", substring));
    assert!(term_present("Watching nascar tonight", "car", substring));
}

#[test]
fn punctuation_bounds_words() {
    let default = MatchOptions::default();
    for text in ["car.", "car,", "car!", "car?", "\"car\"", "'car'", "car;", "[car]", "car/"] {
        assert!(term_present(text, "car", default), "{text}");
    }
    assert!(!term_present("car2", "car", default));
    assert!(!term_present("caré", "car", default));
}

#[test]
fn terms_with_punctuation_edges() {
    let default = MatchOptions::default();
    assert!(term_present("I write c++ daily", "c++", default));
    assert!(term_present("I write c++daily", "c++", default));
    assert!(!term_present("I write abc++ daily", "c++", default));
}

#[test]
fn any_later_occurrence_counts() {
    assert!(term_present("scar then car", "car", MatchOptions::default()));
}

#[test]
fn blank_texts_and_terms() {
    let default = MatchOptions::default();
    assert!(!term_present("", "car", default));
    assert!(!term_present("a car", "", default));
    assert!(!term_present("a car", " _ ", default));
}

#[test]
fn unicode_case_folding() {
    let default = MatchOptions::default();
    assert!(term_present("Un CAFÉ noir", "café", default));
    assert!(term_present("ΣΟΦΙΑ", "σοφια", default));
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

fn moderation_rules() -> RuleSet {
    RuleSetBuilder::new()
        .rule("20_red_cars", |r| {
            r.id(20).when(all(["car", "red"]).and(not_any(["sun"])))
        })
        .rule("10_beach", |r| r.id(10).when(at_least(2, ["sun", "sea", "beach"])))
        .rule("30_any_car", |r| r.id(30).when(any(["car", "truck"])))
        .rule("00_disabled", |r| r.id(1).inactive().when(any(["car"])))
        .compile()
        .unwrap()
}

#[test]
fn first_match_in_name_order() {
    let ruleset = moderation_rules();
    assert_eq!(
        ruleset.execution_order(),
        vec!["10_beach", "20_red_cars", "30_any_car"]
    );

    let verdict = ruleset.evaluate("a red car under the sun by the sea").unwrap();
    assert_eq!(verdict.rule_id(), RuleId(10));
    assert_eq!(verdict.hits(), &hits(&["sea", "sun"]));

    let verdict = ruleset.evaluate("a red car by the lake").unwrap();
    assert_eq!(verdict.rule_id(), RuleId(20));
    assert_eq!(verdict.hits(), &hits(&["car", "red"]));

    let verdict = ruleset.evaluate("a red car in the sun").unwrap();
    assert_eq!(verdict.rule_id(), RuleId(30));
    assert_eq!(verdict.hits(), &hits(&["car"]));

    assert!(ruleset.evaluate("a quiet afternoon").is_none());
}

#[test]
fn hits_and_verdict_agree() {
    let ruleset = moderation_rules();
    let text = "a red car by the lake";
    assert_eq!(ruleset.hits(text), ruleset.evaluate(text).unwrap().into_hits());
    assert!(ruleset.hits("a quiet afternoon").is_empty());
}

#[test]
fn detailed_report_lists_considered_rules() {
    let ruleset = moderation_rules();
    let report = ruleset.evaluate_detailed("a red car by the lake");
    assert_eq!(report.considered(), &["10_beach", "20_red_cars"]);
    assert_eq!(report.verdict().unwrap().rule_id(), RuleId(20));

    let report = ruleset.evaluate_detailed("nothing here");
    assert!(report.verdict().is_none());
    assert_eq!(report.considered().len(), 3);
}

#[test]
fn verdict_flag_record() {
    let ruleset = RuleSet::from_rules([ModerationRule::new(
        7,
        "cars",
        any(["Car"]).case_sensitive(),
    )])
    .unwrap();

    let record = ruleset.evaluate("a Car").unwrap().flag();
    assert_eq!(record.reason, "moderation:rule");
    assert_eq!(record.rule_id, RuleId(7));
    assert_eq!(record.rule_name, "cars");
    assert_eq!(
        record.options,
        Some(MatchOptions {
            case_sensitive: true,
            whole_word: true,
        })
    );
    assert_eq!(record.hits, vec!["Car".to_owned()]);

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["rule_id"], 7);
    assert_eq!(json["hits"][0], "Car");
}

#[test]
fn not_any_root_matches_without_hits() {
    let ruleset = RuleSet::from_rules([ModerationRule::new(1, "no_sun", not_any(["sun"]))])
        .unwrap();
    let verdict = ruleset.evaluate("a cloudy day").unwrap();
    assert_eq!(verdict.rule_id(), RuleId(1));
    assert!(verdict.hits().is_empty());
    assert!(ruleset.check("a cloudy day"));
}

#[test]
fn or_collects_hits_from_every_matching_branch() {
    let node = any(["car"]).or(any(["sea"])).or(any(["plane"]));
    let outcome = node.evaluate("a car by the sea");
    assert!(outcome.matched);
    assert_eq!(outcome.hits, hits(&["car", "sea"]));
}

#[test]
fn failed_and_branch_contributes_nothing() {
    let node = and([any(["car"]), any(["plane"])]).or(any(["sea"]));
    let outcome = node.evaluate("a car by the sea");
    assert!(outcome.matched);
    assert_eq!(outcome.hits, hits(&["sea"]));
}

#[test]
fn options_do_not_inherit() {
    // The composite's children keep their own defaults.
    let node = and([any(["Car"]).case_sensitive(), any(["sea"])]);
    assert!(node.matches("Car by the SEA"));
    assert!(!node.matches("car by the SEA"));
}
