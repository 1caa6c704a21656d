use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use snipdrill::session::input::Key;
use snipdrill::session::stats::TypingStats;
use snipdrill::store::KeyValueStore;
use snipdrill::trainer::mode::{Mode, next_time_limit};
use snipdrill::trainer::{Action, Trainer, TrainerEvent};

pub type BoxedStore = Box<dyn KeyValueStore>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Typing,
    Results,
    CharacterStats,
}

pub struct App {
    pub screen: AppScreen,
    pub trainer: Trainer<BoxedStore>,
    /// Stats of the most recently completed snippet.
    pub last_completed: Option<TypingStats>,
    pub confirm_clear: bool,
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(trainer: Trainer<BoxedStore>) -> Self {
        let mut app = Self {
            screen: AppScreen::Typing,
            trainer,
            last_completed: None,
            confirm_clear: false,
            notice: None,
            should_quit: false,
        };
        let actions = app.trainer.start();
        app.apply(actions);
        app
    }

    pub fn dispatch(&mut self, event: TrainerEvent, now: Instant) {
        let actions = self.trainer.dispatch(event, now);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            debug!(?action, "trainer action");
            match action {
                Action::SnippetLoaded { .. } => self.notice = None,
                Action::NoSnippets { language } => {
                    self.notice = Some(format!("No snippets available for {language}"));
                }
                Action::SnippetCompleted(stats) => self.last_completed = Some(stats),
                Action::RunFinished(_) => self.screen = AppScreen::Results,
                Action::PreferencesChanged => self.last_completed = None,
                Action::TrackingCleared => {
                    self.last_completed = None;
                    self.notice = Some("Character data cleared".to_string());
                }
                Action::CountdownStarted(_) | Action::CountdownTick(_) => {}
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.dispatch(TrainerEvent::Tick, now);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            AppScreen::Typing => self.handle_typing_key(key, ctrl, now),
            AppScreen::Results => self.handle_results_key(key, now),
            AppScreen::CharacterStats => self.handle_stats_key(key, now),
        }
    }

    fn handle_typing_key(&mut self, key: KeyEvent, ctrl: bool, now: Instant) {
        if ctrl {
            match key.code {
                KeyCode::Char('n') => self.dispatch(TrainerEvent::NextSnippet, now),
                KeyCode::Char('t') => {
                    let mode = self.trainer.mode().toggle();
                    self.dispatch(TrainerEvent::SetMode(mode), now);
                }
                KeyCode::Char('l') => self.cycle_language(now),
                KeyCode::Char('o') => self.cycle_option(now),
                KeyCode::Char('s') => self.screen = AppScreen::CharacterStats,
                _ => {}
            }
            return;
        }
        if key.code == KeyCode::Esc {
            self.dispatch(TrainerEvent::Reset, now);
            return;
        }
        if let Some(k) = key_from_event(&key) {
            self.dispatch(TrainerEvent::Key(k), now);
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent, now: Instant) {
        let event = match key.code {
            KeyCode::Char('r') => TrainerEvent::Retry,
            KeyCode::Char('n') | KeyCode::Enter => TrainerEvent::DismissResults,
            KeyCode::Char('q') | KeyCode::Esc => TrainerEvent::DismissResults,
            _ => return,
        };
        self.dispatch(event, now);
        self.screen = AppScreen::Typing;
    }

    fn handle_stats_key(&mut self, key: KeyEvent, now: Instant) {
        // Confirmation prompt takes priority
        if self.confirm_clear {
            if key.code == KeyCode::Char('y') {
                self.dispatch(TrainerEvent::ClearTracking, now);
            }
            self.confirm_clear = false;
            return;
        }
        match key.code {
            KeyCode::Char('x') | KeyCode::Delete => self.confirm_clear = true,
            KeyCode::Char('q') | KeyCode::Esc => self.screen = AppScreen::Typing,
            _ => {}
        }
    }

    fn cycle_language(&mut self, now: Instant) {
        let current = self.trainer.preferences().language.clone();
        let next = self
            .trainer
            .catalog()
            .next_language(&current)
            .map(str::to_string);
        if let Some(next) = next {
            self.dispatch(TrainerEvent::SetLanguage(next), now);
        }
    }

    /// Time limit in timed mode, snippet length in training mode.
    fn cycle_option(&mut self, now: Instant) {
        let prefs = self.trainer.preferences();
        let event = match prefs.mode {
            Mode::Timed => TrainerEvent::SetTimeLimit(next_time_limit(prefs.time_limit_secs)),
            Mode::Training => TrainerEvent::SetSnippetLength(prefs.snippet_length.next()),
        };
        self.dispatch(event, now);
    }
}

/// Translate a terminal key into a session key. Control chords are handled by
/// the app before this is reached.
pub fn key_from_event(key: &KeyEvent) -> Option<Key> {
    match key.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Esc => None,
        other => Some(Key::Named(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use snipdrill::catalog::{Catalog, Difficulty, Snippet, SnippetLength};
    use snipdrill::store::MemoryStore;
    use snipdrill::trainer::mode::Preferences;
    use snipdrill::trainer::{RunPhase, TrainerSettings};

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn test_app(mode: Mode) -> App {
        let mut catalog = Catalog::default();
        for lang in ["alpha", "beta"] {
            catalog.insert_snippets(
                lang,
                lang,
                vec![
                    Snippet::new("s1", "ab", SnippetLength::Short, Difficulty::Easy, lang),
                    Snippet::new("m1", "abcd", SnippetLength::Medium, Difficulty::Easy, lang),
                ],
            );
        }
        let prefs = Preferences {
            language: "alpha".to_string(),
            mode,
            ..Preferences::default()
        };
        let store: BoxedStore = Box::new(MemoryStore::new());
        let trainer = Trainer::with_rng(
            catalog,
            store,
            prefs,
            TrainerSettings::default(),
            SmallRng::seed_from_u64(3),
        );
        App::new(trainer)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_from_event(&press(KeyCode::Char('{'))), Some(Key::Char('{')));
        assert_eq!(key_from_event(&press(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(key_from_event(&press(KeyCode::Tab)), Some(Key::Tab));
        assert_eq!(key_from_event(&press(KeyCode::Backspace)), Some(Key::Backspace));
        assert_eq!(key_from_event(&press(KeyCode::Esc)), None);
        assert!(key_from_event(&press(KeyCode::Left)).unwrap().is_ignored());
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = test_app(Mode::Training);
        app.handle_key(ctrl('c'), Instant::now());
        assert!(app.should_quit);
    }

    #[test]
    fn test_typing_completes_snippet() {
        let mut app = test_app(Mode::Training);
        let now = Instant::now();
        app.handle_key(press(KeyCode::Char('a')), now);
        app.handle_key(press(KeyCode::Char('b')), now);
        assert_eq!(app.last_completed.as_ref().map(|s| s.accuracy), Some(100));
    }

    #[test]
    fn test_ctrl_shortcuts_change_preferences() {
        let mut app = test_app(Mode::Training);
        let now = Instant::now();
        app.handle_key(ctrl('o'), now);
        assert_eq!(app.trainer.preferences().snippet_length, SnippetLength::Medium);
        app.handle_key(ctrl('l'), now);
        assert_eq!(app.trainer.preferences().language, "beta");
        app.handle_key(ctrl('t'), now);
        assert_eq!(app.trainer.mode(), Mode::Timed);
        app.handle_key(ctrl('o'), now);
        assert_eq!(app.trainer.preferences().time_limit_secs, 45);
    }

    #[test]
    fn test_timed_run_shows_results_then_returns() {
        let mut app = test_app(Mode::Timed);
        let t0 = Instant::now();
        app.handle_key(press(KeyCode::Char('x')), t0);
        app.tick(t0 + Duration::from_secs(31));
        assert_eq!(app.screen, AppScreen::Results);
        assert!(matches!(app.trainer.phase(), RunPhase::Results(_)));

        app.handle_key(press(KeyCode::Char('r')), t0 + Duration::from_secs(32));
        assert_eq!(app.screen, AppScreen::Typing);
        assert_eq!(app.trainer.phase(), &RunPhase::Typing);
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut app = test_app(Mode::Training);
        let now = Instant::now();
        app.handle_key(press(KeyCode::Char('a')), now);
        app.handle_key(ctrl('s'), now);
        assert_eq!(app.screen, AppScreen::CharacterStats);

        app.handle_key(press(KeyCode::Char('x')), now);
        assert!(app.confirm_clear);
        app.handle_key(press(KeyCode::Char('n')), now);
        assert!(!app.confirm_clear);
        assert_eq!(app.trainer.tracker().total_attempts(), 1);

        app.handle_key(press(KeyCode::Char('x')), now);
        app.handle_key(press(KeyCode::Char('y')), now);
        assert_eq!(app.trainer.tracker().total_attempts(), 0);
        assert!(app.notice.is_some());

        app.handle_key(press(KeyCode::Esc), now);
        assert_eq!(app.screen, AppScreen::Typing);
    }
}
