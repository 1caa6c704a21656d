use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use snipdrill::catalog::Snippet;
use snipdrill::session::typing::{CharStatus, TypingSession};

use crate::ui::palette::Palette;

pub struct TypingArea<'a> {
    snippet: &'a Snippet,
    session: &'a TypingSession,
    title: String,
}

impl<'a> TypingArea<'a> {
    pub fn new(snippet: &'a Snippet, session: &'a TypingSession) -> Self {
        let title = match snippet.name() {
            Some(name) => format!(" {name} "),
            None => format!(" {} ", snippet.id()),
        };
        Self {
            snippet,
            session,
            title,
        }
    }
}

/// A render token maps a single snippet character to its display form.
struct RenderToken {
    idx: usize,
    display: String,
    is_line_break: bool,
}

/// Newlines get a visible marker and end the line; literal tabs get an arrow.
fn build_render_tokens(code: &[char]) -> Vec<RenderToken> {
    code.iter()
        .enumerate()
        .map(|(idx, &ch)| match ch {
            '\n' => RenderToken {
                idx,
                display: "\u{21b5}".to_string(), // ↵
                is_line_break: true,
            },
            '\t' => RenderToken {
                idx,
                display: "\u{2192} ".to_string(), // →
                is_line_break: false,
            },
            _ => RenderToken {
                idx,
                display: ch.to_string(),
                is_line_break: false,
            },
        })
        .collect()
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let code = self.snippet.chars();
        let cursor = self.session.cursor();
        let tokens = build_render_tokens(code);

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];

        for token in &tokens {
            let status = self.session.char_status(self.snippet, token.idx);
            let style = match status {
                Some(CharStatus::Correct) => Style::default().fg(Palette::TEXT_CORRECT),
                Some(CharStatus::Incorrect(_)) => Style::default()
                    .fg(Palette::TEXT_INCORRECT)
                    .bg(Palette::TEXT_INCORRECT_BG)
                    .add_modifier(Modifier::UNDERLINED),
                None if token.idx == cursor => {
                    Style::default().fg(Palette::CURSOR_FG).bg(Palette::CURSOR_BG)
                }
                None => Style::default().fg(Palette::TEXT_PENDING),
            };

            // Show what was typed over a wrong character, except whitespace
            // markers which stay visible
            let display = match status {
                Some(CharStatus::Incorrect(actual))
                    if !token.is_line_break && !actual.is_whitespace() =>
                {
                    actual.to_string()
                }
                _ => token.display.clone(),
            };

            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(display, style));
            }
            if token.is_line_break {
                lines.push(Vec::new());
            }
        }

        let ratatui_lines: Vec<Line> = lines.into_iter().map(Line::from).collect();

        let mut block = Block::bordered()
            .title(self.title)
            .border_style(Style::default().fg(Palette::BORDER))
            .style(Style::default().bg(Palette::BG));
        if let Some(description) = self.snippet.description() {
            block = block.title_bottom(Line::styled(
                format!(" {description} "),
                Style::default().fg(Palette::TEXT_PENDING),
            ));
        }

        Paragraph::new(ratatui_lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
