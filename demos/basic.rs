use termguard::{RuleSetBuilder, all, any, at_least, not_any};

fn main() {
    // Define rules
    let ruleset = RuleSetBuilder::new()
        .rule("red_cars", |r| {
            r.id(1).when(all(["car", "red", "fast"]).and(not_any(["sun"])))
        })
        .rule("seaside_garage", |r| {
            r.id(2).when(
                at_least(3, ["car", "red", "fast", "sun", "sea", "beach"])
                    .and(any(["demo", "garage", "house"])),
            )
        })
        .compile()
        .expect("failed to compile ruleset");

    println!("{ruleset}");

    for text in [
        "A red fast car zooms by the sea",
        "red fast car near a garage under the sun",
        "red car parked at home",
    ] {
        match ruleset.evaluate(text) {
            Some(verdict) => println!("{text:?} -> {verdict}"),
            None => println!("{text:?} -> no rule matched"),
        }
    }
}
