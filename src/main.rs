mod app;
mod event;
mod ui;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::KeyEventKind;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::{info, warn};

use snipdrill::catalog::{Catalog, SnippetLength};
use snipdrill::config::Config;
use snipdrill::engine::scoring::format_clock;
use snipdrill::store::{self, JsonStore, MemoryStore, PREFERENCES};
use snipdrill::trainer::mode::{Mode, Preferences};
use snipdrill::trainer::{RunPhase, Trainer};

use app::{App, AppScreen, BoxedStore};
use event::{AppEvent, EventHandler};
use ui::components::dashboard::Dashboard;
use ui::components::stats_dashboard::StatsDashboard;
use ui::components::stats_sidebar::StatsSidebar;
use ui::components::typing_area::TypingArea;
use ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use ui::palette::Palette;

const LOG_FILE: &str = "snipdrill.log";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliMode {
    Training,
    Timed,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Training => Mode::Training,
            CliMode::Timed => Mode::Timed,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLength {
    Short,
    Medium,
    Long,
}

impl From<CliLength> for SnippetLength {
    fn from(length: CliLength) -> Self {
        match length {
            CliLength::Short => SnippetLength::Short,
            CliLength::Medium => SnippetLength::Medium,
            CliLength::Long => SnippetLength::Long,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "snipdrill",
    version,
    about = "Terminal typing trainer for code snippets with adaptive practice"
)]
struct Cli {
    #[arg(short, long, help = "Snippet language (javascript, typescript, python, rust, go)")]
    language: Option<String>,

    #[arg(short, long, value_enum, help = "Practice mode")]
    mode: Option<CliMode>,

    #[arg(short, long, help = "Timed run length in seconds (30, 45, 60)")]
    time: Option<u32>,

    #[arg(long, value_enum, help = "Snippet length for training mode")]
    length: Option<CliLength>,

    #[arg(long, help = "Directory for saved progress and logs")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Keep progress in memory only")]
    ephemeral: bool,

    #[arg(short, long, help = "Log debug output")]
    verbose: bool,
}

impl Cli {
    fn has_overrides(&self) -> bool {
        self.language.is_some() || self.mode.is_some() || self.time.is_some() || self.length.is_some()
    }

    fn apply(&self, prefs: &mut Preferences) {
        if let Some(language) = &self.language {
            prefs.language = language.to_lowercase();
        }
        if let Some(mode) = self.mode {
            prefs.mode = mode.into();
        }
        if let Some(time) = self.time {
            prefs.time_limit_secs = time;
        }
        if let Some(length) = self.length {
            prefs.snippet_length = length.into();
        }
    }
}

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(data_dir: &Path, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let file = fs::create_dir_all(data_dir).and_then(|_| File::create(data_dir.join(LOG_FILE)));
    if let Ok(file) = file {
        let _ = tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(level)
            .try_init();
    }
}

fn open_store(data_dir: PathBuf, ephemeral: bool) -> BoxedStore {
    if ephemeral {
        return Box::new(MemoryStore::new());
    }
    match JsonStore::with_base_dir(data_dir) {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(%err, "falling back to in-memory storage");
            Box::new(MemoryStore::new())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_err) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(JsonStore::default_dir);
    init_logging(&data_dir, cli.verbose);
    if let Some(err) = config_err {
        warn!(error = %err, "ignoring unreadable config file");
    }

    let catalog = Catalog::builtin().context("failed to load built-in snippets")?;
    config.normalize(&catalog.language_keys());
    info!(languages = catalog.language_keys().len(), "loaded snippet catalog");

    let mut store = open_store(data_dir, cli.ephemeral);
    let mut prefs: Preferences =
        store::load(&store, PREFERENCES).unwrap_or_else(|| config.preferences());
    if cli.has_overrides() {
        cli.apply(&mut prefs);
        prefs.normalize(&catalog.language_keys());
        if let Err(err) = store::save(&mut store, PREFERENCES, &prefs) {
            warn!(%err, "failed to save preferences");
        }
    }

    let trainer = Trainer::new(catalog, store, prefs, config.trainer_settings());
    let mut app = App::new(trainer);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app, Instant::now()))?;

        match events.next()? {
            // Repeat and release events would double-count keystrokes
            AppEvent::Key(key) if key.kind == KeyEventKind::Press => {
                app.handle_key(key, Instant::now())
            }
            AppEvent::Key(_) | AppEvent::Resize => {}
            AppEvent::Tick => app.tick(Instant::now()),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render(frame: &mut ratatui::Frame, app: &App, now: Instant) {
    let area = frame.area();

    let bg = Block::default().style(Style::default().bg(Palette::BG));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Typing => render_typing(frame, app, now),
        AppScreen::Results => render_results(frame, app),
        AppScreen::CharacterStats => render_character_stats(frame, app),
    }
}

fn header_line(app: &App, compact_stats: Option<String>) -> Line<'static> {
    let trainer = &app.trainer;
    let prefs = trainer.preferences();
    let language = trainer
        .catalog()
        .language(&prefs.language)
        .map_or_else(|| prefs.language.clone(), |l| l.display_name.clone());

    let status = match prefs.mode {
        Mode::Timed => {
            let run = trainer.run();
            format!(
                " {} | {} done",
                format_clock(run.time_remaining),
                run.completed_count
            )
        }
        Mode::Training => format!(" {}", prefs.snippet_length),
    };

    let header_style = Style::default().fg(Palette::FG).bg(Palette::HEADER_BG);
    let mut spans = vec![
        Span::styled(
            " snipdrill ",
            header_style.fg(Palette::ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} | {language} |", prefs.mode), header_style),
        Span::styled(status, header_style),
    ];
    if let Some(stats) = compact_stats {
        spans.push(Span::styled(stats, header_style));
    }
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(
            format!(" | {notice}"),
            header_style.fg(Palette::WARNING),
        ));
    }
    Line::from(spans)
}

fn render_typing(frame: &mut ratatui::Frame, app: &App, now: Instant) {
    let area = frame.area();
    let trainer = &app.trainer;
    let live = trainer.current_stats(now);

    let option_hint = match trainer.mode() {
        Mode::Timed => "[^O] Time limit",
        Mode::Training => "[^O] Length",
    };
    let hints = [
        "[Esc] Restart",
        "[^N] Next",
        "[^T] Mode",
        "[^L] Language",
        option_hint,
        "[^S] Stats",
        "[^C] Quit",
    ];
    let hint_lines = pack_hint_lines(&hints, area.width as usize);
    let app_layout = AppLayout::new(area, hint_lines.len() as u16);

    // Without a sidebar the live numbers go in the header
    let compact = if app_layout.tier.show_sidebar() {
        None
    } else {
        live.as_ref().map(|s| {
            format!(
                " | WPM: {} | Acc: {}% | Errors: {}",
                s.wpm, s.accuracy, s.incorrect_chars
            )
        })
    };
    let header = Paragraph::new(header_line(app, compact))
        .style(Style::default().bg(Palette::HEADER_BG));
    frame.render_widget(header, app_layout.header);

    match trainer.snippet() {
        Some(snippet) => {
            frame.render_widget(TypingArea::new(snippet, trainer.session()), app_layout.main);
        }
        None => {
            let empty = Paragraph::new(Line::from(Span::styled(
                " No snippets available. Press Ctrl-L to switch language.",
                Style::default().fg(Palette::TEXT_PENDING),
            )))
            .block(Block::bordered().border_style(Style::default().fg(Palette::BORDER)));
            frame.render_widget(empty, app_layout.main);
        }
    }

    if let Some(sidebar_area) = app_layout.sidebar {
        let sidebar = StatsSidebar::new(live, app.last_completed.as_ref(), trainer.tracker());
        frame.render_widget(sidebar, sidebar_area);
    }

    let lines: Vec<Line> = hint_lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(Palette::TEXT_PENDING))))
        .collect();
    frame.render_widget(Paragraph::new(lines), app_layout.footer);
}

fn render_results(frame: &mut ratatui::Frame, app: &App) {
    let trainer = &app.trainer;
    if let RunPhase::Results(stats) = trainer.phase() {
        let prefs = trainer.preferences();
        let centered = centered_rect(50, 60, frame.area());
        let dashboard = Dashboard::new(
            stats,
            trainer.run().completed_count,
            prefs.time_limit_secs,
            &prefs.language,
        );
        frame.render_widget(dashboard, centered);
    }
}

fn render_character_stats(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let dashboard = StatsDashboard::new(
        app.trainer.tracker(),
        app.trainer.history(),
        app.confirm_clear,
    );
    frame.render_widget(dashboard, area);
}
