use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use snipdrill::catalog::{Catalog, Difficulty, Snippet, SnippetLength};
use snipdrill::session::input::Key;
use snipdrill::session::stats::calculate_wpm;
use snipdrill::store::schema::TrackingData;
use snipdrill::store::{
    self, JsonStore, KEYSTROKE_TRACKING, KeyValueStore, MemoryStore, PREFERENCES,
};
use snipdrill::trainer::mode::{Mode, Preferences};
use snipdrill::trainer::{Action, RunPhase, Trainer, TrainerEvent, TrainerSettings};

const SNIPPET_LEN: usize = 40;

/// Four identical-looking short snippets of 'a', so the pick order does not
/// change the totals.
fn uniform_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    let snippets = (1..=4)
        .map(|i| {
            Snippet::new(
                format!("a{i}"),
                "a".repeat(SNIPPET_LEN),
                SnippetLength::Short,
                Difficulty::Easy,
                "plain",
            )
        })
        .collect();
    catalog.insert_snippets("plain", "Plain", snippets);
    catalog
}

fn trainer_with<S: KeyValueStore>(store: S, mode: Mode) -> Trainer<S> {
    let prefs = Preferences {
        language: "plain".to_string(),
        mode,
        ..Preferences::default()
    };
    Trainer::with_rng(
        uniform_catalog(),
        store,
        prefs,
        TrainerSettings::default(),
        SmallRng::seed_from_u64(7),
    )
}

/// Type `count` keys into the current snippet, the first `errors` of them
/// wrong. Each key lands 10ms after the previous one.
fn type_keys<S: KeyValueStore>(
    t: &mut Trainer<S>,
    count: usize,
    errors: usize,
    mut now: Instant,
) -> (Instant, Vec<Action>) {
    let mut actions = Vec::new();
    for i in 0..count {
        let c = if i < errors { 'z' } else { 'a' };
        actions.extend(t.dispatch(TrainerEvent::Key(Key::Char(c)), now));
        now += Duration::from_millis(10);
    }
    (now, actions)
}

fn completed(actions: &[Action]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, Action::SnippetCompleted(_)))
        .count()
}

#[test]
fn timed_run_accumulates_snippets_and_partial_progress() {
    let mut t = trainer_with(MemoryStore::new(), Mode::Timed);
    t.start();
    let t0 = Instant::now();

    let mut now = t0;
    for errors in [0, 2] {
        let (after, actions) = type_keys(&mut t, SNIPPET_LEN, errors, now);
        assert_eq!(completed(&actions), 1);
        // Let the next snippet load
        now = after + Duration::from_millis(250);
        let actions = t.dispatch(TrainerEvent::Tick, now);
        assert!(
            actions
                .iter()
                .any(|a| matches!(a, Action::SnippetLoaded { .. }))
        );
    }
    assert_eq!(t.run().completed_count, 2);

    // Partway through the third snippet when time runs out
    let (_, actions) = type_keys(&mut t, 36, 1, now);
    assert_eq!(completed(&actions), 0);
    assert_eq!(t.session().started_at(), Some(t0));

    let actions = t.dispatch(TrainerEvent::Tick, t0 + Duration::from_secs(30));
    let Some(Action::RunFinished(stats)) = actions.last() else {
        panic!("expected the run to finish, got {actions:?}");
    };
    assert_eq!(stats.correct_chars, 113);
    assert_eq!(stats.incorrect_chars, 3);
    // Keys typed, not the length of the unfinished snippet
    assert_eq!(stats.total_chars, 116);
    assert_eq!(stats.accuracy, 97);
    assert_eq!(stats.wpm, calculate_wpm(113, 30.0));
    assert_eq!(stats.wpm, 45);
    assert_eq!(t.phase(), &RunPhase::Results(stats.clone()));

    // Only the run summary is recorded
    let records = &t.history().records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].snippets_completed, 2);
    assert!(records[0].snippet_id.is_none());
    assert_eq!(records[0].stats.wpm, 45);
}

#[test]
fn timed_snippet_speed_ignores_time_before_it_started() {
    let mut t = trainer_with(MemoryStore::new(), Mode::Timed);
    t.start();
    let t0 = Instant::now();
    let step = Duration::from_millis(100);

    let mut speeds = Vec::new();
    let mut start = t0;
    for _ in 0..2 {
        let mut at = start;
        for _ in 0..SNIPPET_LEN {
            for action in t.dispatch(TrainerEvent::Key(Key::Char('a')), at) {
                if let Action::SnippetCompleted(stats) = action {
                    speeds.push(stats.wpm);
                }
            }
            at += step;
        }
        // Pause before the next snippet
        start = at + Duration::from_secs(10);
        t.dispatch(TrainerEvent::Tick, at + Duration::from_millis(250));
    }

    // 40 chars over 3.9s either way
    assert_eq!(speeds, vec![123, 123]);
    assert!(t.history().records.is_empty());
    assert_eq!(t.run().totals.correct_chars, 2 * SNIPPET_LEN);
}

#[test]
fn snippet_finished_just_before_expiry_counts_once() {
    let mut t = trainer_with(MemoryStore::new(), Mode::Timed);
    t.start();
    let t0 = Instant::now();

    t.dispatch(TrainerEvent::Key(Key::Char('a')), t0);
    // Completes at 29.88s, inside the transition delay of the deadline
    let late = t0 + Duration::from_millis(29_500);
    let (_, actions) = type_keys(&mut t, SNIPPET_LEN - 1, 0, late);
    assert_eq!(completed(&actions), 1);

    // Expiry lands before the transition to the next snippet
    let actions = t.dispatch(TrainerEvent::Tick, t0 + Duration::from_secs(31));
    let Some(Action::RunFinished(stats)) = actions.last() else {
        panic!("expected the run to finish, got {actions:?}");
    };
    assert_eq!(stats.correct_chars, SNIPPET_LEN);
    assert_eq!(t.run().completed_count, 1);
    assert!(!t.is_transitioning());
}

#[test]
fn completing_key_after_expiry_is_ignored() {
    let mut t = trainer_with(MemoryStore::new(), Mode::Timed);
    t.start();
    let t0 = Instant::now();

    type_keys(&mut t, SNIPPET_LEN - 1, 0, t0);
    let actions = t.dispatch(
        TrainerEvent::Key(Key::Char('a')),
        t0 + Duration::from_secs(31),
    );
    assert_eq!(completed(&actions), 0);
    let Some(Action::RunFinished(stats)) = actions.last() else {
        panic!("expected the run to finish, got {actions:?}");
    };
    assert_eq!(stats.correct_chars, SNIPPET_LEN - 1);
    assert_eq!(t.run().completed_count, 0);
    assert_eq!(t.session().cursor(), SNIPPET_LEN - 1);
}

#[test]
fn retry_after_results_starts_a_fresh_run() {
    let mut t = trainer_with(MemoryStore::new(), Mode::Timed);
    t.start();
    let t0 = Instant::now();
    type_keys(&mut t, 5, 0, t0);
    t.dispatch(TrainerEvent::Tick, t0 + Duration::from_secs(30));
    assert!(matches!(t.phase(), RunPhase::Results(_)));

    t.dispatch(TrainerEvent::Retry, t0 + Duration::from_secs(40));
    assert_eq!(t.phase(), &RunPhase::Typing);
    assert_eq!(t.run().time_remaining, 30);
    assert!(!t.run().timer_running);
    assert_eq!(t.session().cursor(), 0);
    assert!(t.session().started_at().is_none());
}

#[test]
fn progress_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let t0 = Instant::now();

    {
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut t = trainer_with(store, Mode::Training);
        t.start();
        let (_, actions) = type_keys(&mut t, SNIPPET_LEN, 3, t0);
        assert_eq!(completed(&actions), 1);
        t.dispatch(TrainerEvent::SetSnippetLength(SnippetLength::Medium), t0);
    }

    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let prefs: Preferences = store::load(&store, PREFERENCES).unwrap();
    assert_eq!(prefs.snippet_length, SnippetLength::Medium);
    assert_eq!(prefs.language, "plain");

    let tracking: TrackingData = store::load(&store, KEYSTROKE_TRACKING).unwrap();
    let a = &tracking[&'a'];
    assert_eq!(a.total_attempts, SNIPPET_LEN as u32);
    assert_eq!(a.error_count, 3);
    assert_eq!(a.mistakes.get(&'z'), Some(&3));

    let t = trainer_with(store, Mode::Training);
    assert_eq!(t.tracker().total_attempts(), SNIPPET_LEN as u32);
    assert_eq!(t.history().records.len(), 1);
    assert_eq!(t.history().records[0].stats.incorrect_chars, 3);
}

#[test]
fn clearing_tracking_removes_stored_data() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let mut t = trainer_with(store, Mode::Training);
    t.start();
    type_keys(&mut t, 4, 1, Instant::now());

    let actions = t.dispatch(TrainerEvent::ClearTracking, Instant::now());
    assert_eq!(actions, vec![Action::TrackingCleared]);
    assert_eq!(t.tracker().total_attempts(), 0);
    assert!(t.store().get(KEYSTROKE_TRACKING).unwrap().is_none());

    // Typing resumes tracking from scratch
    type_keys(&mut t, 1, 0, Instant::now());
    assert_eq!(t.tracker().total_attempts(), 1);
}
