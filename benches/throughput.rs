use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{criterion_group, criterion_main, Criterion};
use termguard::{Moderator, RuleSetBuilder, all, any, not_any};

const TEXTS: &[&str] = &[
    "a red car parked by the sea",
    "a red car under the sun",
    "nothing to report today",
    "boats and ships in the harbour",
];

fn build_moderator() -> Arc<Moderator> {
    let mut builder = RuleSetBuilder::new();
    let n: u64 = 20;

    for i in 0..n {
        builder = builder.rule(&format!("r{i:02}"), move |r| {
            r.id(i).when(any([format!("word{i}"), format!("other{i}")]))
        });
    }
    builder = builder
        .rule("zz_cars", |r| {
            r.id(100).when(all(["car", "red"]).and(not_any(["sun"])))
        })
        .rule("zz_ships", |r| r.id(101).when(any(["boat", "ship", "ships"])));

    Arc::new(Moderator::with_rules(builder.compile().unwrap()))
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let moderator = build_moderator();

        group.bench_function(format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let m = Arc::clone(&moderator);
                        thread::spawn(move || {
                            let start = Instant::now();
                            for i in 0..per_thread {
                                let _ = m.verdict(TEXTS[i as usize % TEXTS.len()]);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
