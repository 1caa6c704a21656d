pub mod mode;
pub mod scheduler;

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Snippet, SnippetLength};
use crate::engine::key_stats::KeystrokeTracker;
use crate::engine::scoring::ScoreWeights;
use crate::engine::selection::{RecentWindow, select_adaptive_snippet, select_random_snippet};
use crate::session::input::Key;
use crate::session::result::{SessionHistory, SessionRecord};
use crate::session::stats::TypingStats;
use crate::session::typing::TypingSession;
use crate::store::schema::TrackingData;
use crate::store::{self, KEYSTROKE_TRACKING, KeyValueStore, PREFERENCES, SESSION_HISTORY};

pub use mode::{Mode, Preferences, RunPhase, RunState};
pub use scheduler::{Scheduler, TaskHandle};

/// Weak characters handed to the selector, which uses the top few.
const WEAK_CANDIDATES: usize = 10;
const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Inputs to the trainer. Every state change goes through
/// [`Trainer::dispatch`].
#[derive(Clone, Debug, PartialEq)]
pub enum TrainerEvent {
    Key(Key),
    /// Clock advanced; only runs due tasks.
    Tick,
    SetMode(Mode),
    SetTimeLimit(u32),
    SetSnippetLength(SnippetLength),
    SetLanguage(String),
    /// Restart the current snippet. In timed mode this also restarts the run.
    Reset,
    /// Skip to a new snippet, starting a fresh run.
    NextSnippet,
    /// Start a new timed run on the same snippet.
    Retry,
    /// Leave the results screen with a fresh run on a new snippet.
    DismissResults,
    ClearTracking,
}

/// What happened while handling an event, for the front end to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SnippetLoaded { id: String },
    NoSnippets { language: String },
    SnippetCompleted(TypingStats),
    CountdownStarted(u32),
    CountdownTick(u32),
    RunFinished(TypingStats),
    PreferencesChanged,
    TrackingCleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    CountdownTick,
    AdvanceSnippet,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainerSettings {
    pub weights: ScoreWeights,
    pub transition_delay: Duration,
    pub recent_window: usize,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            transition_delay: Duration::from_millis(200),
            recent_window: 10,
        }
    }
}

/// Coordinates the typing session, character tracker, snippet selection and
/// the timed-run countdown.
pub struct Trainer<S: KeyValueStore> {
    catalog: Catalog,
    store: S,
    settings: TrainerSettings,
    prefs: Preferences,
    tracker: KeystrokeTracker,
    history: SessionHistory,
    session: TypingSession,
    snippet: Option<Snippet>,
    recent: RecentWindow,
    run: RunState,
    phase: RunPhase,
    scheduler: Scheduler<Task>,
    countdown: Option<TaskHandle>,
    advance: Option<TaskHandle>,
    rng: SmallRng,
}

impl<S: KeyValueStore> Trainer<S> {
    pub fn new(catalog: Catalog, store: S, prefs: Preferences, settings: TrainerSettings) -> Self {
        Self::with_rng(catalog, store, prefs, settings, SmallRng::from_entropy())
    }

    pub fn with_rng(
        catalog: Catalog,
        store: S,
        mut prefs: Preferences,
        settings: TrainerSettings,
        rng: SmallRng,
    ) -> Self {
        if prefs.normalize(&catalog.language_keys()) {
            warn!(language = %prefs.language, "adjusted preferences to available options");
        }
        let scores: TrackingData = store::load_or_default(&store, KEYSTROKE_TRACKING);
        let tracker = KeystrokeTracker::from_scores(scores, settings.weights);
        let history: SessionHistory = store::load_or_default(&store, SESSION_HISTORY);
        debug!(
            characters = tracker.scores().len(),
            records = history.records.len(),
            "restored tracking data"
        );
        let run = RunState::new(prefs.time_limit_secs);

        Self {
            catalog,
            store,
            settings,
            prefs,
            tracker,
            history,
            session: TypingSession::new(),
            snippet: None,
            recent: RecentWindow::new(settings.recent_window),
            run,
            phase: RunPhase::Typing,
            scheduler: Scheduler::new(),
            countdown: None,
            advance: None,
            rng,
        }
    }

    /// Load the first snippet.
    pub fn start(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.load_next_snippet(&mut actions);
        actions
    }

    pub fn dispatch(&mut self, event: TrainerEvent, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        // Due tasks first so a countdown that already expired wins over a
        // keystroke arriving in the same poll.
        self.run_due(now, &mut actions);

        match event {
            TrainerEvent::Key(key) => self.handle_key(&key, now, &mut actions),
            TrainerEvent::Tick => {}
            TrainerEvent::SetMode(mode) => {
                if mode != self.prefs.mode {
                    self.prefs.mode = mode;
                    self.preferences_changed(&mut actions);
                }
            }
            TrainerEvent::SetTimeLimit(secs) => {
                if !mode::is_valid_time_limit(secs) {
                    warn!(secs, "ignoring unsupported time limit");
                } else if secs != self.prefs.time_limit_secs {
                    self.prefs.time_limit_secs = secs;
                    self.preferences_changed(&mut actions);
                }
            }
            TrainerEvent::SetSnippetLength(length) => {
                if length != self.prefs.snippet_length {
                    self.prefs.snippet_length = length;
                    self.preferences_changed(&mut actions);
                }
            }
            TrainerEvent::SetLanguage(language) => {
                if self.catalog.language(&language).is_none() {
                    warn!(%language, "ignoring unknown language");
                } else if language != self.prefs.language {
                    self.prefs.language = language;
                    self.preferences_changed(&mut actions);
                }
            }
            TrainerEvent::Reset => self.restart_run(false, &mut actions),
            TrainerEvent::NextSnippet | TrainerEvent::DismissResults => {
                self.restart_run(true, &mut actions)
            }
            TrainerEvent::Retry => self.restart_run(false, &mut actions),
            TrainerEvent::ClearTracking => self.clear_tracking(&mut actions),
        }
        actions
    }

    fn run_due(&mut self, now: Instant, actions: &mut Vec<Action>) {
        while let Some((due, task)) = self.scheduler.pop_next_due(now) {
            match task {
                Task::CountdownTick => {
                    self.countdown = None;
                    self.countdown_tick(due, actions);
                }
                Task::AdvanceSnippet => {
                    self.advance = None;
                    self.load_next_snippet(actions);
                }
            }
        }
    }

    fn handle_key(&mut self, key: &Key, now: Instant, actions: &mut Vec<Action>) {
        if self.phase != RunPhase::Typing {
            return;
        }
        let Some(snippet) = self.snippet.as_ref() else {
            return;
        };

        let event = self.session.handle_key(snippet, key, now);

        if self.prefs.mode == Mode::Timed
            && !self.run.timer_running
            && self.session.started_at().is_some()
        {
            self.start_countdown(now, actions);
        }

        if let Some(ev) = event {
            self.tracker.record_keystroke(ev.expected, ev.actual, ev.timestamp);
            self.persist_tracking();
        }

        if self.session.is_complete() && !self.run.completion_latched {
            self.run.completion_latched = true;
            self.on_snippet_completed(now, actions);
        }
    }

    fn start_countdown(&mut self, now: Instant, actions: &mut Vec<Action>) {
        self.cancel_countdown();
        self.run.timer_running = true;
        self.run.time_remaining = self.prefs.time_limit_secs;
        self.countdown = Some(self.scheduler.schedule(now + COUNTDOWN_STEP, Task::CountdownTick));
        info!(limit = self.prefs.time_limit_secs, "timed run started");
        actions.push(Action::CountdownStarted(self.run.time_remaining));
    }

    fn countdown_tick(&mut self, due: Instant, actions: &mut Vec<Action>) {
        if !self.run.timer_running {
            return;
        }
        self.run.time_remaining = self.run.time_remaining.saturating_sub(1);
        actions.push(Action::CountdownTick(self.run.time_remaining));
        if self.run.time_remaining == 0 {
            self.finish_run(due, actions);
        } else {
            // Chain off the due instant so late polls do not drift the clock
            self.countdown = Some(self.scheduler.schedule(due + COUNTDOWN_STEP, Task::CountdownTick));
        }
    }

    fn on_snippet_completed(&mut self, now: Instant, actions: &mut Vec<Action>) {
        let Some(stats) = self.session.final_stats().cloned() else {
            return;
        };
        let snippet_id = self.snippet.as_ref().map(|s| s.id().to_string()).unwrap_or_default();

        let stats = match self.prefs.mode {
            Mode::Timed => {
                if self.run.time_remaining == 0 || !self.run.timer_running {
                    return;
                }
                self.run.totals.add(&stats);
                // Only the run summary goes into history for timed runs
                self.session.snippet_stats().unwrap_or(stats)
            }
            Mode::Training => {
                self.record(SessionRecord::snippet(
                    self.prefs.mode,
                    &self.prefs.language,
                    &snippet_id,
                    stats.clone(),
                ));
                stats
            }
        };
        self.run.completed_count += 1;
        info!(
            snippet = %snippet_id,
            wpm = stats.wpm,
            accuracy = stats.accuracy,
            "snippet completed"
        );
        actions.push(Action::SnippetCompleted(stats));

        self.cancel_advance();
        self.advance = Some(
            self.scheduler
                .schedule(now + self.settings.transition_delay, Task::AdvanceSnippet),
        );
    }

    fn finish_run(&mut self, now: Instant, actions: &mut Vec<Action>) {
        self.run.timer_running = false;
        self.cancel_countdown();
        self.cancel_advance();

        let mut totals = self.run.totals;
        // A snippet already latched was added when it completed
        if !self.run.completion_latched {
            if let Some(live) = self.current_stats(now) {
                totals.add(&live);
            }
        }
        let stats = totals.finalize(self.prefs.time_limit_secs);
        info!(
            wpm = stats.wpm,
            accuracy = stats.accuracy,
            snippets = self.run.completed_count,
            "timed run finished"
        );

        self.record(SessionRecord::timed_run(
            &self.prefs.language,
            self.run.completed_count,
            stats.clone(),
        ));
        self.phase = RunPhase::Results(stats.clone());
        actions.push(Action::RunFinished(stats));
    }

    fn load_next_snippet(&mut self, actions: &mut Vec<Action>) {
        let picked = match self.prefs.mode {
            Mode::Training => {
                let pool = self
                    .catalog
                    .snippets_of_length(&self.prefs.language, self.prefs.snippet_length);
                let weak = self.tracker.weakest_characters(WEAK_CANDIDATES);
                select_adaptive_snippet(&pool, &weak, self.recent.ids(), &mut self.rng).cloned()
            }
            Mode::Timed => {
                let pool = self
                    .catalog
                    .snippets_of_length(&self.prefs.language, SnippetLength::Short);
                select_random_snippet(&pool, self.recent.ids(), &mut self.rng).cloned()
            }
        };

        let Some(snippet) = picked else {
            warn!(language = %self.prefs.language, "no snippets to select from");
            self.snippet = None;
            self.session.reset();
            actions.push(Action::NoSnippets {
                language: self.prefs.language.clone(),
            });
            return;
        };

        debug!(snippet = snippet.id(), mode = %self.prefs.mode, "selected snippet");
        self.recent.push(snippet.id());
        if self.prefs.mode == Mode::Timed && self.run.timer_running {
            self.session.reset_for_time_mode();
        } else {
            self.session.reset();
            self.tracker.reset_timer();
        }
        self.run.completion_latched = false;
        actions.push(Action::SnippetLoaded {
            id: snippet.id().to_string(),
        });
        self.snippet = Some(snippet);
    }

    /// Throw away run progress. With `new_snippet` false the current snippet is
    /// typed again from the start.
    fn restart_run(&mut self, new_snippet: bool, actions: &mut Vec<Action>) {
        self.cancel_countdown();
        self.cancel_advance();
        self.run = RunState::new(self.prefs.time_limit_secs);
        self.phase = RunPhase::Typing;
        self.tracker.reset_timer();

        if new_snippet || self.snippet.is_none() {
            self.load_next_snippet(actions);
        } else {
            self.session.reset();
        }
    }

    fn preferences_changed(&mut self, actions: &mut Vec<Action>) {
        info!(
            mode = %self.prefs.mode,
            language = %self.prefs.language,
            time_limit = self.prefs.time_limit_secs,
            length = %self.prefs.snippet_length,
            "preferences changed"
        );
        if let Err(e) = store::save(&mut self.store, PREFERENCES, &self.prefs) {
            warn!(error = %e, "could not save preferences");
        }
        actions.push(Action::PreferencesChanged);
        self.restart_run(true, actions);
    }

    fn clear_tracking(&mut self, actions: &mut Vec<Action>) {
        self.tracker.clear();
        self.history.clear();
        for key in [KEYSTROKE_TRACKING, SESSION_HISTORY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "could not remove stored data");
            }
        }
        info!("tracking data cleared");
        actions.push(Action::TrackingCleared);
    }

    fn record(&mut self, record: SessionRecord) {
        self.history.push(record);
        if let Err(e) = store::save(&mut self.store, SESSION_HISTORY, &self.history) {
            warn!(error = %e, "could not save session history");
        }
    }

    fn persist_tracking(&mut self) {
        if let Err(e) = store::save(&mut self.store, KEYSTROKE_TRACKING, self.tracker.scores()) {
            warn!(error = %e, "could not save keystroke tracking");
        }
    }

    fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            self.scheduler.cancel(handle);
        }
    }

    fn cancel_advance(&mut self) {
        if let Some(handle) = self.advance.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn mode(&self) -> Mode {
        self.prefs.mode
    }

    pub fn tracker(&self) -> &KeystrokeTracker {
        &self.tracker
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn snippet(&self) -> Option<&Snippet> {
        self.snippet.as_ref()
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    /// True between a snippet's completion and the next snippet appearing.
    pub fn is_transitioning(&self) -> bool {
        self.advance.is_some()
    }

    pub fn has_pending_countdown(&self) -> bool {
        self.countdown
            .is_some_and(|handle| self.scheduler.is_pending(handle))
    }

    pub fn current_stats(&self, now: Instant) -> Option<TypingStats> {
        self.session.current_stats(self.snippet.as_ref()?, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Difficulty;
    use crate::store::MemoryStore;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.insert_snippets(
            "test",
            "Test",
            vec![
                Snippet::new("short-a", "ab", SnippetLength::Short, Difficulty::Easy, "test"),
                Snippet::new("short-b", "cd", SnippetLength::Short, Difficulty::Easy, "test"),
                Snippet::new("long-a", "{ x }", SnippetLength::Long, Difficulty::Hard, "test"),
            ],
        );
        catalog
    }

    fn trainer(mode: Mode) -> Trainer<MemoryStore> {
        let prefs = Preferences {
            language: "test".to_string(),
            mode,
            ..Preferences::default()
        };
        Trainer::with_rng(
            catalog(),
            MemoryStore::new(),
            prefs,
            TrainerSettings::default(),
            SmallRng::seed_from_u64(42),
        )
    }

    fn type_current(t: &mut Trainer<MemoryStore>, now: Instant) -> Vec<Action> {
        let code: Vec<char> = t.snippet().unwrap().chars().to_vec();
        let mut actions = Vec::new();
        for c in code {
            actions.extend(t.dispatch(TrainerEvent::Key(Key::Char(c)), now));
        }
        actions
    }

    #[test]
    fn test_start_loads_snippet_of_preferred_length() {
        let mut t = trainer(Mode::Training);
        let actions = t.start();
        assert!(matches!(actions.as_slice(), [Action::SnippetLoaded { .. }]));
        assert_eq!(t.snippet().unwrap().length(), SnippetLength::Short);
    }

    #[test]
    fn test_training_completion_advances_after_delay() {
        let mut t = trainer(Mode::Training);
        t.start();
        let first = t.snippet().unwrap().id().to_string();
        let t0 = Instant::now();

        let actions = type_current(&mut t, t0);
        assert!(actions.iter().any(|a| matches!(a, Action::SnippetCompleted(_))));
        assert!(t.is_transitioning());
        assert_eq!(t.run().completed_count, 1);
        assert_eq!(t.history().records.len(), 1);

        // Not yet
        t.dispatch(TrainerEvent::Tick, t0 + Duration::from_millis(100));
        assert_eq!(t.snippet().unwrap().id(), first);

        // No weak characters yet, so the pick is uniform and may repeat
        let actions = t.dispatch(TrainerEvent::Tick, t0 + Duration::from_millis(250));
        assert!(matches!(actions.as_slice(), [Action::SnippetLoaded { .. }]));
        assert!(!t.is_transitioning());
        assert_eq!(t.session().cursor(), 0);
        assert!(!t.run().completion_latched);
    }

    #[test]
    fn test_keystrokes_reach_tracker_and_store() {
        let mut t = trainer(Mode::Training);
        t.start();
        type_current(&mut t, Instant::now());
        assert_eq!(t.tracker().total_attempts(), 2);
        let stored: TrackingData = store::load_or_default(t.store(), KEYSTROKE_TRACKING);
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_timed_countdown_starts_on_first_key() {
        let mut t = trainer(Mode::Timed);
        t.start();
        assert!(!t.has_pending_countdown());
        let t0 = Instant::now();
        let actions = t.dispatch(TrainerEvent::Key(Key::Char('z')), t0);
        assert!(actions.contains(&Action::CountdownStarted(30)));
        assert!(t.has_pending_countdown());

        let actions = t.dispatch(TrainerEvent::Tick, t0 + Duration::from_millis(2500));
        assert_eq!(
            actions,
            vec![Action::CountdownTick(29), Action::CountdownTick(28)]
        );
        assert_eq!(t.run().time_remaining, 28);
    }

    #[test]
    fn test_timed_snippet_keeps_start_time_across_advance() {
        let mut t = trainer(Mode::Timed);
        t.start();
        let t0 = Instant::now();
        type_current(&mut t, t0);
        assert_eq!(t.run().totals.correct_chars, 2);
        t.dispatch(TrainerEvent::Tick, t0 + Duration::from_millis(300));
        assert_eq!(t.session().started_at(), Some(t0));
        assert_eq!(t.session().cursor(), 0);
    }

    #[test]
    fn test_mode_change_cancels_countdown() {
        let mut t = trainer(Mode::Timed);
        t.start();
        let t0 = Instant::now();
        t.dispatch(TrainerEvent::Key(Key::Char('z')), t0);
        assert!(t.has_pending_countdown());

        let actions = t.dispatch(TrainerEvent::SetMode(Mode::Training), t0);
        assert!(actions.contains(&Action::PreferencesChanged));
        assert!(!t.has_pending_countdown());
        assert!(!t.run().timer_running);
        assert_eq!(t.run().completed_count, 0);

        // Stale countdown never fires
        let actions = t.dispatch(TrainerEvent::Tick, t0 + Duration::from_secs(40));
        assert!(actions.is_empty());
        assert_eq!(t.phase(), &RunPhase::Typing);
    }

    #[test]
    fn test_time_limit_validation() {
        let mut t = trainer(Mode::Timed);
        t.start();
        assert!(t.dispatch(TrainerEvent::SetTimeLimit(17), Instant::now()).is_empty());
        t.dispatch(TrainerEvent::SetTimeLimit(60), Instant::now());
        assert_eq!(t.preferences().time_limit_secs, 60);
        assert_eq!(t.run().time_remaining, 60);
        let stored: Option<Preferences> = store::load(t.store(), PREFERENCES);
        assert_eq!(stored.unwrap().time_limit_secs, 60);
    }

    #[test]
    fn test_unknown_language_ignored() {
        let mut t = trainer(Mode::Training);
        t.start();
        assert!(t.dispatch(TrainerEvent::SetLanguage("cobol".into()), Instant::now()).is_empty());
        assert_eq!(t.preferences().language, "test");
    }

    #[test]
    fn test_reset_restarts_same_snippet() {
        let mut t = trainer(Mode::Training);
        t.start();
        let id = t.snippet().unwrap().id().to_string();
        t.dispatch(TrainerEvent::Key(Key::Char('q')), Instant::now());
        t.dispatch(TrainerEvent::Reset, Instant::now());
        assert_eq!(t.snippet().unwrap().id(), id);
        assert_eq!(t.session().cursor(), 0);
        assert!(t.session().started_at().is_none());
    }

    #[test]
    fn test_clear_tracking() {
        let mut t = trainer(Mode::Training);
        t.start();
        type_current(&mut t, Instant::now());
        let actions = t.dispatch(TrainerEvent::ClearTracking, Instant::now());
        assert!(actions.contains(&Action::TrackingCleared));
        assert_eq!(t.tracker().total_attempts(), 0);
        assert!(t.history().records.is_empty());
        assert!(t.store().get(KEYSTROKE_TRACKING).unwrap().is_none());
    }

    #[test]
    fn test_empty_language_yields_no_snippet() {
        let mut catalog = Catalog::default();
        catalog.insert_snippets("empty", "Empty", Vec::new());
        let prefs = Preferences {
            language: "empty".to_string(),
            ..Preferences::default()
        };
        let mut t = Trainer::with_rng(
            catalog,
            MemoryStore::new(),
            prefs,
            TrainerSettings::default(),
            SmallRng::seed_from_u64(1),
        );
        let actions = t.start();
        assert_eq!(
            actions,
            vec![Action::NoSnippets {
                language: "empty".to_string()
            }]
        );
        // Keys are no-ops without a snippet
        assert!(t.dispatch(TrainerEvent::Key(Key::Char('a')), Instant::now()).is_empty());
    }
}
