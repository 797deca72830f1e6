use termguard::RuleSet;

const RULES: &str = r#"
# Rules are scanned in name order; the first match wins.
rule a_spam (id 10):
    any("buy now", "free money") or at_least(2, "click", "offer", "limited")

rule b_shouting (id 20):
    any("SPAM", "SCAM") [case_sensitive]

rule c_fragments (id 30, inactive):
    any("scam") [substring]
"#;

fn main() {
    let ruleset = RuleSet::from_dsl(RULES).expect("failed to parse rules");
    println!("{ruleset}");
    println!("Scan order: {:?}", ruleset.execution_order());

    for text in [
        "Click now for a limited offer",
        "this is NOT A SCAM",
        "a scammer wrote this",
        "Buy_now while stocks last",
    ] {
        let report = ruleset.evaluate_detailed(text);
        println!("{text:?}: {report}");
        if let Some(verdict) = report.verdict() {
            let record = verdict.flag();
            println!(
                "  flag: {}",
                serde_json::to_string(&record).expect("flag record serializes")
            );
        }
    }
}
