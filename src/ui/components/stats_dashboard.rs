use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Row, Table, Widget};

use snipdrill::engine::key_stats::KeystrokeTracker;
use snipdrill::engine::scoring::display_char;
use snipdrill::session::result::SessionHistory;

use crate::ui::palette::Palette;

const WEAK_ROWS: usize = 15;
const HISTORY_ROWS: usize = 10;

/// Character weakness table, recent history and the clear-data prompt.
pub struct StatsDashboard<'a> {
    tracker: &'a KeystrokeTracker,
    history: &'a SessionHistory,
    confirm_clear: bool,
}

impl<'a> StatsDashboard<'a> {
    pub fn new(tracker: &'a KeystrokeTracker, history: &'a SessionHistory, confirm_clear: bool) -> Self {
        Self {
            tracker,
            history,
            confirm_clear,
        }
    }

    fn weak_table(&self) -> Table<'static> {
        let header = Row::new(["Char", "Attempts", "Error %", "Avg ms", "Score", "Often typed"])
            .style(
                Style::default()
                    .fg(Palette::ACCENT)
                    .add_modifier(Modifier::BOLD),
            );
        let rows: Vec<Row> = self
            .tracker
            .weakest_characters(WEAK_ROWS)
            .into_iter()
            .map(|s| {
                let mistake = s
                    .top_mistake()
                    .map(|(c, n)| format!("{} x{n}", display_char(c)))
                    .unwrap_or_default();
                Row::new(vec![
                    display_char(s.ch),
                    s.total_attempts.to_string(),
                    format!("{:.0}", s.error_rate * 100.0),
                    format!("{:.0}", s.average_time_ms),
                    format!("{:.1}", s.composite_score),
                    mistake,
                ])
                .style(Style::default().fg(if s.composite_score > self.tracker.weights().needs_training_threshold {
                    Palette::WARNING
                } else {
                    Palette::FG
                }))
            })
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Length(8),
                Constraint::Length(8),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::bordered()
                .title(" Weakest characters ")
                .border_style(Style::default().fg(Palette::BORDER)),
        )
    }

    fn history_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let Some((wpm, acc)) = self.history.recent_averages(HISTORY_ROWS) {
            lines.push(Line::from(Span::styled(
                format!("Last {HISTORY_ROWS}: {wpm:.0} wpm, {acc:.0}% accuracy"),
                Style::default().fg(Palette::ACCENT),
            )));
        }
        if let Some(best) = self.history.best_wpm() {
            lines.push(Line::from(Span::styled(
                format!("Best: {best} wpm"),
                Style::default().fg(Palette::SUCCESS),
            )));
        }
        lines.push(Line::from(""));
        for record in self.history.recent(HISTORY_ROWS).iter().rev() {
            let what = record
                .snippet_id
                .clone()
                .unwrap_or_else(|| format!("{} snippets", record.snippets_completed));
            lines.push(Line::from(Span::styled(
                format!(
                    "{} {:<8} {:<10} {:>3} wpm {:>3}%  {what}",
                    record.timestamp.format("%m-%d %H:%M"),
                    record.mode.as_str(),
                    record.language,
                    record.stats.wpm,
                    record.stats.accuracy,
                ),
                Style::default().fg(Palette::FG),
            )));
        }
        if self.history.records.is_empty() {
            lines.push(Line::from(Span::styled(
                "No sessions recorded",
                Style::default().fg(Palette::TEXT_PENDING),
            )));
        }
        lines
    }
}

impl Widget for StatsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(HISTORY_ROWS as u16 + 5),
                Constraint::Length(1),
            ])
            .split(area);

        Widget::render(self.weak_table(), layout[0], buf);

        Paragraph::new(self.history_lines())
            .block(
                Block::bordered()
                    .title(" Recent sessions ")
                    .border_style(Style::default().fg(Palette::BORDER)),
            )
            .render(layout[1], buf);

        let footer = if self.confirm_clear {
            Span::styled(
                " Clear all character data and history? [y] Yes  [any key] No",
                Style::default()
                    .fg(Palette::ERROR)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                " [x] Clear data  [q/Esc] Back",
                Style::default().fg(Palette::TEXT_PENDING),
            )
        };
        Paragraph::new(Line::from(footer)).render(layout[2], buf);
    }
}
