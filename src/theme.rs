use ratatui::style::{Color, Modifier, Style};

// Centralized theme colors for painting the document.

pub const ACCENT_RGB: (u8, u8, u8) = (200, 100, 0);
pub const ACCENT_ALT_RGB: (u8, u8, u8) = (255, 165, 0);

pub fn accent() -> Color {
    Color::Rgb(ACCENT_RGB.0, ACCENT_RGB.1, ACCENT_RGB.2)
}

pub fn accent_alt() -> Color {
    Color::Rgb(ACCENT_ALT_RGB.0, ACCENT_ALT_RGB.1, ACCENT_ALT_RGB.2)
}

// Page
pub fn page_bg() -> Color {
    Color::Reset
}
pub fn page_fg() -> Color {
    Color::Gray
}

// Controls
pub fn control_fg() -> Color {
    Color::White
}
pub fn control_disabled_fg() -> Color {
    Color::DarkGray
}
pub fn focused_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(accent_alt())
        .add_modifier(Modifier::BOLD)
}

// Popover surface
pub fn popover_bg() -> Color {
    Color::Black
}
pub fn popover_fg() -> Color {
    Color::White
}
pub fn popover_border() -> Color {
    accent()
}
pub fn container_border() -> Color {
    Color::DarkGray
}

// Log panel
pub fn log_bg() -> Color {
    Color::Black
}
pub fn log_fg() -> Color {
    Color::Gray
}
pub fn log_highlight() -> Color {
    accent_alt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_returns_rgb() {
        assert_eq!(accent(), Color::Rgb(200, 100, 0));
        assert_eq!(accent_alt(), Color::Rgb(255, 165, 0));
    }

    #[test]
    fn focused_style_is_visible() {
        let style = focused_style();
        assert_eq!(style.bg, Some(accent_alt()));
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }
}
