use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use snipdrill::engine::scoring::format_clock;
use snipdrill::session::stats::TypingStats;

use crate::ui::palette::Palette;

/// Summary shown when a timed run's countdown reaches zero.
pub struct Dashboard<'a> {
    stats: &'a TypingStats,
    snippets_completed: u32,
    time_limit_secs: u32,
    language: &'a str,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        stats: &'a TypingStats,
        snippets_completed: u32,
        time_limit_secs: u32,
        language: &'a str,
    ) -> Self {
        Self {
            stats,
            snippets_completed,
            time_limit_secs,
            language,
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Time's up ")
            .border_style(Style::default().fg(Palette::ACCENT))
            .style(Style::default().bg(Palette::BG));

        let big = Style::default()
            .fg(Palette::ACCENT)
            .add_modifier(Modifier::BOLD);
        let label = Style::default().fg(Palette::TEXT_PENDING);
        let s = self.stats;

        let lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(format!("{} ", s.wpm), big),
                Span::styled("wpm", label),
            ]),
            Line::from(vec![
                Span::styled(
                    format!("{}% ", s.accuracy),
                    Style::default()
                        .fg(Palette::accuracy(s.accuracy))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("accuracy", label),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "{} correct, {} incorrect",
                    s.correct_chars, s.incorrect_chars
                ),
                Style::default().fg(Palette::FG),
            )),
            Line::from(Span::styled(
                format!(
                    "{} snippet{} in {} ({})",
                    self.snippets_completed,
                    if self.snippets_completed == 1 { "" } else { "s" },
                    format_clock(self.time_limit_secs),
                    self.language
                ),
                Style::default().fg(Palette::FG),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "[r] Retry  [n/Enter] Next  [q/Esc] Back",
                Style::default().fg(Palette::ACCENT),
            )),
        ];

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
