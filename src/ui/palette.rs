use ratatui::style::Color;

/// Fixed colour set for every screen.
pub struct Palette;

impl Palette {
    pub const BG: Color = Color::Rgb(0x1e, 0x1e, 0x2e);
    pub const FG: Color = Color::Rgb(0xcd, 0xd6, 0xf4);
    pub const TEXT_CORRECT: Color = Color::Rgb(0xa6, 0xe3, 0xa1);
    pub const TEXT_INCORRECT: Color = Color::Rgb(0xf3, 0x8b, 0xa8);
    pub const TEXT_INCORRECT_BG: Color = Color::Rgb(0x45, 0x27, 0x3a);
    pub const TEXT_PENDING: Color = Color::Rgb(0x58, 0x5b, 0x70);
    pub const CURSOR_BG: Color = Color::Rgb(0xf5, 0xe0, 0xdc);
    pub const CURSOR_FG: Color = Color::Rgb(0x1e, 0x1e, 0x2e);
    pub const ACCENT: Color = Color::Rgb(0x89, 0xb4, 0xfa);
    pub const BORDER: Color = Color::Rgb(0x45, 0x47, 0x5a);
    pub const HEADER_BG: Color = Color::Rgb(0x31, 0x32, 0x44);
    pub const BAR_FILLED: Color = Color::Rgb(0x89, 0xb4, 0xfa);
    pub const BAR_EMPTY: Color = Color::Rgb(0x31, 0x32, 0x44);
    pub const ERROR: Color = Color::Rgb(0xf3, 0x8b, 0xa8);
    pub const WARNING: Color = Color::Rgb(0xf9, 0xe2, 0xaf);
    pub const SUCCESS: Color = Color::Rgb(0xa6, 0xe3, 0xa1);

    /// Green at 95% and up, yellow from 85%, red below.
    pub fn accuracy(accuracy: u32) -> Color {
        if accuracy >= 95 {
            Self::SUCCESS
        } else if accuracy >= 85 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }
}
