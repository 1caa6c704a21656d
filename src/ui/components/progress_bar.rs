use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Widget};

use snipdrill::engine::scoring::skill_level;

use crate::ui::palette::Palette;

/// Training progress gauge: a one-row bar whose fill colour follows the skill
/// tier, captioned with the percentage and tier name.
pub struct ProgressBar {
    percent: f64,
}

impl ProgressBar {
    /// `percent` is on a 0-100 scale and is clamped.
    pub fn new(percent: f64) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
        }
    }

    fn fill_color(&self) -> Color {
        if self.percent >= 60.0 {
            Palette::SUCCESS
        } else if self.percent >= 25.0 {
            Palette::BAR_FILLED
        } else {
            Palette::WARNING
        }
    }

    fn caption(&self) -> String {
        format!("{:.0}% {}", self.percent, skill_level(self.percent))
    }
}

impl Widget for ProgressBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Training ")
            .border_style(Style::default().fg(Palette::BORDER));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let split = inner.x + (self.percent / 100.0 * inner.width as f64) as u16;
        let filled = Style::default().fg(Palette::BG).bg(self.fill_color());
        let empty = Style::default().fg(Palette::FG).bg(Palette::BAR_EMPTY);
        for x in inner.x..inner.right() {
            buf[(x, inner.y)].set_style(if x < split { filled } else { empty });
        }

        // Caption keeps the cell colours underneath
        let caption = self.caption();
        let width = caption.chars().count() as u16;
        let start = inner.x + inner.width.saturating_sub(width) / 2;
        for (i, ch) in caption.chars().enumerate() {
            let x = start + i as u16;
            if x >= inner.right() {
                break;
            }
            buf[(x, inner.y)].set_char(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamped_and_captioned() {
        let bar = ProgressBar::new(140.0);
        assert_eq!(bar.percent, 100.0);
        assert_eq!(bar.fill_color(), Palette::SUCCESS);
        assert!(bar.caption().starts_with("100% "));
        assert_eq!(ProgressBar::new(-3.0).percent, 0.0);
    }

    #[test]
    fn test_render_fills_proportionally() {
        let area = Rect::new(0, 0, 12, 3);
        let mut buf = Buffer::empty(area);
        ProgressBar::new(50.0).render(area, &mut buf);
        // Inner row is 10 cells wide, half filled
        assert_eq!(buf[(1, 1)].bg, Palette::BAR_FILLED);
        assert_eq!(buf[(5, 1)].bg, Palette::BAR_FILLED);
        assert_eq!(buf[(6, 1)].bg, Palette::BAR_EMPTY);
        assert_eq!(buf[(10, 1)].bg, Palette::BAR_EMPTY);
    }
}
