//! Color palette and style constants for the CineMatch TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(15, 18, 26);
pub const C_ACCENT: Color = Color::Rgb(245, 197, 24);
pub const C_LOGO: Color = Color::Rgb(226, 232, 240);
pub const C_MUTED: Color = Color::Rgb(71, 85, 105);
pub const C_SEPARATOR: Color = Color::Rgb(30, 41, 59);
pub const C_SECONDARY: Color = Color::Rgb(148, 163, 184);
pub const C_PRIMARY: Color = Color::Rgb(226, 232, 240);
pub const C_SELECTION_BG: Color = Color::Rgb(30, 41, 59);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 48, 64);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_SEARCH_BG: Color = Color::Rgb(15, 23, 42);
pub const C_SEARCH_FG: Color = Color::Rgb(241, 245, 249);
pub const C_DROPDOWN_BG: Color = Color::Rgb(22, 30, 48);
pub const C_RATING: Color = Color::Rgb(255, 210, 50);
pub const C_POSTER: Color = Color::Rgb(90, 110, 140);
pub const C_LOADING: Color = Color::Rgb(148, 163, 184);
pub const C_TOAST_INFO: Color = Color::Rgb(80, 160, 220);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_MODE: Color = Color::Rgb(115, 115, 138);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

pub fn style_selected_focused() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(C_PANEL_BORDER_FOCUSED)
    } else {
        Style::default().fg(C_PANEL_BORDER)
    }
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
