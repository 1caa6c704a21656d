use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use snipdrill::engine::key_stats::KeystrokeTracker;
use snipdrill::engine::scoring::describe_weak_characters;
use snipdrill::session::stats::TypingStats;

use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::palette::Palette;

/// Weak characters listed under "Needs work".
const NEEDS_WORK_LIMIT: usize = 4;

pub struct StatsSidebar<'a> {
    live: Option<TypingStats>,
    last_completed: Option<&'a TypingStats>,
    tracker: &'a KeystrokeTracker,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        live: Option<TypingStats>,
        last_completed: Option<&'a TypingStats>,
        tracker: &'a KeystrokeTracker,
    ) -> Self {
        Self {
            live,
            last_completed,
            tracker,
        }
    }
}

fn stat_line(label: &str, value: String, color: ratatui::style::Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(Palette::FG)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn stats_lines(stats: Option<&TypingStats>) -> Vec<Line<'static>> {
    let Some(stats) = stats else {
        return vec![Line::from(Span::styled(
            "Start typing...",
            Style::default().fg(Palette::TEXT_PENDING),
        ))];
    };
    vec![
        stat_line("WPM:", stats.wpm.to_string(), Palette::ACCENT),
        stat_line(
            "Accuracy:",
            format!("{}%", stats.accuracy),
            Palette::accuracy(stats.accuracy),
        ),
        stat_line("Errors:", stats.incorrect_chars.to_string(), Palette::ERROR),
        stat_line("Time:", format!("{:.1}s", stats.elapsed_secs), Palette::FG),
    ]
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(6),
            ])
            .split(area);

        let block = |title: &str| {
            Block::bordered()
                .title(format!(" {title} "))
                .border_style(Style::default().fg(Palette::BORDER))
                .style(Style::default().bg(Palette::BG))
        };

        Paragraph::new(stats_lines(self.live.as_ref()))
            .block(block("Current"))
            .render(sections[0], buf);

        ProgressBar::new(self.tracker.training_progress()).render(sections[1], buf);

        let needs = self.tracker.needs_training();
        let mut weak_lines: Vec<Line> = describe_weak_characters(&needs, NEEDS_WORK_LIMIT)
            .into_iter()
            .map(|s| Line::from(Span::styled(s, Style::default().fg(Palette::WARNING))))
            .collect();
        if weak_lines.is_empty() {
            weak_lines.push(Line::from(Span::styled(
                "Nothing yet",
                Style::default().fg(Palette::TEXT_PENDING),
            )));
        }
        if needs.len() > NEEDS_WORK_LIMIT {
            weak_lines.push(Line::from(Span::styled(
                format!("+{} more", needs.len() - NEEDS_WORK_LIMIT),
                Style::default()
                    .fg(Palette::TEXT_PENDING)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        Paragraph::new(weak_lines)
            .block(block("Needs work"))
            .render(sections[2], buf);

        if let Some(last) = self.last_completed {
            Paragraph::new(stats_lines(Some(last)))
                .block(block("Last snippet"))
                .render(sections[3], buf);
        }
    }
}
