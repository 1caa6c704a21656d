use std::time::Instant;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use snipdrill::catalog::{Catalog, SnippetLength};
use snipdrill::engine::key_stats::KeystrokeTracker;
use snipdrill::engine::scoring::ScoreWeights;
use snipdrill::engine::selection::{select_adaptive_snippet, select_random_snippet};

/// Tracker with a few weak punctuation characters, built from synthetic
/// keystrokes against every snippet in the language.
fn trained_tracker(catalog: &Catalog, language: &str) -> KeystrokeTracker {
    let mut tracker = KeystrokeTracker::new(ScoreWeights::default());
    let now = Instant::now();
    for snippet in catalog.snippets(language) {
        for (i, &c) in snippet.chars().iter().enumerate() {
            let actual = if matches!(c, '{' | '}' | ';' | '(') && i % 3 == 0 {
                'x'
            } else {
                c
            };
            tracker.record_keystroke(c, actual, now);
        }
    }
    tracker
}

fn bench_selection(c: &mut Criterion) {
    let catalog = Catalog::builtin().expect("built-in snippets load");
    let language = "javascript";
    let tracker = trained_tracker(&catalog, language);
    let weak = tracker.weakest_characters(10);
    let pool = catalog.snippets_of_length(language, SnippetLength::Short);
    let recent: Vec<String> = pool.iter().take(3).map(|s| s.id().to_string()).collect();
    let mut rng = SmallRng::seed_from_u64(1);

    c.bench_function("select_adaptive_snippet (short javascript)", |b| {
        b.iter(|| {
            select_adaptive_snippet(
                black_box(&pool),
                black_box(&weak),
                black_box(&recent),
                &mut rng,
            )
        })
    });

    let all = catalog.snippets(language);
    c.bench_function("select_random_snippet (all javascript)", |b| {
        b.iter(|| select_random_snippet(black_box(all), black_box(&recent), &mut rng))
    });
}

fn bench_tracking(c: &mut Criterion) {
    let catalog = Catalog::builtin().expect("built-in snippets load");
    let tracker = trained_tracker(&catalog, "rust");

    c.bench_function("weakest_characters(10)", |b| {
        b.iter(|| black_box(&tracker).weakest_characters(10))
    });
    c.bench_function("training_progress", |b| {
        b.iter(|| black_box(&tracker).training_progress())
    });
}

criterion_group!(benches, bench_selection, bench_tracking);
criterion_main!(benches);
