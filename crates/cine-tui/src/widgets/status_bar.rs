//! Status bar: bottom line with focus mode, current location, and
//! keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use cine_proto::nav::Location;

use crate::action::ComponentId;
use crate::theme::{C_ACCENT, C_MODE, C_MUTED, C_SECONDARY, C_SEPARATOR};

pub struct StatusInfo<'a> {
    pub focus: Option<ComponentId>,
    pub location: &'a Location,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

fn keys_for(focus: Option<ComponentId>) -> &'static str {
    match focus {
        Some(ComponentId::SearchBox) => {
            "type to search  ↑↓ suggestions  Enter recommend  Esc clear  Tab next  Alt-←/→ history"
        }
        Some(ComponentId::GenreTabs) => {
            "←→ genre  Enter load  h home  [ ] history  / search  Tab next  q quit"
        }
        Some(ComponentId::Results) | None => {
            "↑↓/jk scroll  h home  [ ] history  / search  Tab next  q quit"
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_status_bar(frame: &mut Frame, area: Rect, info: &StatusInfo<'_>) {
    let label = info.focus.map(ComponentId::label).unwrap_or("");
    let arrow = |enabled: bool, glyph: &'static str| {
        let color = if enabled { C_ACCENT } else { C_SEPARATOR };
        Span::styled(glyph, Style::default().fg(color))
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default().fg(C_MODE).add_modifier(Modifier::BOLD),
        ),
        arrow(info.can_go_back, "◂"),
        arrow(info.can_go_forward, "▸"),
        Span::raw(" "),
        Span::styled(info.location.to_string(), Style::default().fg(C_SECONDARY)),
        Span::raw("  "),
        Span::styled(keys_for(info.focus), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
