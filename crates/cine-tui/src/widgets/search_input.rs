//! SearchInput: wraps tui-input for the movie search box.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{style_border, C_MUTED, C_SEARCH_BG, C_SEARCH_FG, C_SECONDARY};

#[derive(Debug, PartialEq, Eq)]
pub enum SearchAction {
    Changed(String),
    Submitted,
    None,
}

pub struct SearchInput {
    input: Input,
    placeholder: String,
}

impl SearchInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Handle a key event. Only edits that change the text report `Changed`.
    ///
    /// Esc clears any text; on an empty box it does nothing.
    pub fn handle_key(&mut self, key: KeyEvent) -> SearchAction {
        match key.code {
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    SearchAction::None
                } else {
                    self.input = Input::default();
                    SearchAction::Changed(String::new())
                }
            }
            KeyCode::Enter => SearchAction::Submitted,
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(change) if change.value => {
                    SearchAction::Changed(self.input.value().to_string())
                }
                _ => SearchAction::None,
            },
        }
    }

    /// Render the bordered search box into `area`. `busy` puts a marker in
    /// the top border while suggestions are on their way.
    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool, busy: bool) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(style_border(focused))
            .style(Style::default().bg(C_SEARCH_BG));
        if busy {
            block = block.title(
                Line::from(Span::styled(" … ", Style::default().fg(C_MUTED))).right_aligned(),
            );
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // "⌕ " prefix
        let prefix = 2u16;
        let width = inner.width.saturating_sub(prefix) as usize;
        let scroll = self.input.visual_scroll(width);
        let value = self.input.value();
        let text = if value.is_empty() {
            Span::styled(self.placeholder.as_str(), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(visible, Style::default().fg(C_SEARCH_FG))
        };
        let line = Line::from(vec![
            Span::styled("⌕ ", Style::default().fg(C_SECONDARY)),
            text,
        ]);
        frame.render_widget(Paragraph::new(line), inner);

        if focused && inner.width > prefix {
            let cursor_x = inner.x + prefix + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(inner.x + inner.width - 1), inner.y));
        }
    }
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new("Search a movie to get recommendations...")
    }
}
