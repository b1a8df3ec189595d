use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quicksearch::projector::{default_columns, FieldFormatter};
use quicksearch::search::{Execution, SearchContext, SearchExecutor, TextMatcher};
use quicksearch::{
    CancellationToken, Entry, Group, IconResolver, Query, ResultProjector, SearchCache,
    SearchMetrics, SearchOptions,
};
use std::sync::Arc;

fn create_tree(group_count: usize, entries_per_group: usize) -> Group {
    let words = ["server", "service", "serial", "mail", "bank", "backup", "router"];
    let mut root = Group::new("root");
    for g in 0..group_count {
        let mut group = Group::new(format!("group {}", g));
        for i in 0..entries_per_group {
            let n = g * entries_per_group + i;
            group = group.with_entry(
                Entry::new(format!("{:08}", n))
                    .with_title(format!("{} {}", words[n % words.len()], n))
                    .with_string("UserName", format!("admin{}", n % 13))
                    .with_string("URL", format!("https://host{}.example.org", n % 97))
                    .with_string("Notes", "rotated quarterly"),
            );
        }
        root = root.with_group(group);
    }
    root
}

fn context(source: Arc<Group>) -> SearchContext {
    SearchContext {
        cache: Arc::new(SearchCache::new()),
        source,
        matcher: Arc::new(TextMatcher::new()),
        projector: Arc::new(ResultProjector::new(
            FieldFormatter::new(default_columns()),
            IconResolver::default(),
        )),
        metrics: SearchMetrics::new(),
    }
}

fn run(context: &SearchContext, text: &str) -> usize {
    let query = Query::new(text, SearchOptions::default());
    match SearchExecutor::new(query, context.clone(), CancellationToken::new()).run() {
        Ok(Execution::Completed(done)) => done.rows.len(),
        _ => 0,
    }
}

fn bench_base_vs_refined(c: &mut Criterion) {
    let mut group = c.benchmark_group("base_vs_refined");
    for size in [1_000, 10_000] {
        let source = Arc::new(create_tree(size / 100, 100));

        group.bench_with_input(BenchmarkId::new("base_scan", size), &source, |b, source| {
            b.iter(|| {
                let context = context(source.clone());
                black_box(run(&context, "serv"))
            })
        });

        group.bench_with_input(BenchmarkId::new("refined_scan", size), &source, |b, source| {
            let seeded = context(source.clone());
            run(&seeded, "ser");
            b.iter(|| {
                let context = SearchContext {
                    cache: Arc::new(SearchCache::new()),
                    ..seeded.clone()
                };
                for result in seeded.cache.snapshot().results() {
                    context.cache.append(result.as_ref().clone());
                }
                black_box(run(&context, "serv"))
            })
        });
    }
    group.finish();
}

fn bench_typing_sequence(c: &mut Criterion) {
    let source = Arc::new(create_tree(50, 100));
    let keystrokes = ["b", "ba", "bac", "back", "backu", "backup"];

    c.bench_function("typing_sequence", |b| {
        b.iter(|| {
            let context = context(source.clone());
            for text in keystrokes {
                black_box(run(&context, text));
            }
        })
    });
}

fn bench_exact_hit(c: &mut Criterion) {
    let source = Arc::new(create_tree(50, 100));
    let context = context(source);
    run(&context, "mail");

    c.bench_function("exact_hit", |b| b.iter(|| black_box(run(&context, "mail"))));
}

criterion_group!(
    benches,
    bench_base_vs_refined,
    bench_typing_sequence,
    bench_exact_hit
);
criterion_main!(benches);
