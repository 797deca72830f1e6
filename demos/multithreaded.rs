use std::sync::Arc;
use std::thread;

use termguard::{Moderator, ModerationRule, any, not_any};

fn main() {
    let moderator = Arc::new(Moderator::new());
    moderator.load_rule(ModerationRule::new(1, "cars", any(["car"])));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let m = Arc::clone(&moderator);
            thread::spawn(move || {
                let text = if i % 2 == 0 { "a car in the sun" } else { "a boat" };
                let result = m.verdict(text);
                println!("Thread {i}: {text:?} -> {result:?}");
            })
        })
        .collect();

    // Swap in a new rule set while readers are running.
    moderator
        .load_rules([
            ModerationRule::new(2, "cars", any(["car"]).and(not_any(["sun"]))),
            ModerationRule::new(3, "boats", any(["boat"])),
        ])
        .expect("rule ids are unique");

    for h in handles {
        h.join().unwrap();
    }

    println!("After reload: {:?}", moderator.matched_rule("a boat"));
}
