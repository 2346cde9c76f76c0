//! Rendering helpers for the main screen. Every function draws into the area
//! it is given and returns the hit areas the mouse handler needs.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use cine_proto::model::{display_title, poster_url, PosterSize, RecommendationItem, SuggestionItem};

use crate::theme::{
    style_accent, style_border, style_default, style_muted, style_secondary,
    style_selected_focused, C_DROPDOWN_BG, C_LOADING, C_LOGO, C_POSTER, C_RATING,
};

pub const LOGO: &str = "CineMatch";
const LOGO_WIDTH: u16 = 14;
const SEARCH_WIDTH: u16 = 60;
const SUGGESTION_ROW_HEIGHT: u16 = 2;
const TAB_SEPARATOR: &str = " │ ";

/// Clip `text` to `max` display columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn year_text(year: Option<i32>) -> String {
    year.map(|y| format!(" ({})", y)).unwrap_or_default()
}

// ── Header ────────────────────────────────────────────────────────────────────

pub struct HeaderAreas {
    pub logo: Rect,
    pub search: Rect,
}

pub fn header_layout(area: Rect) -> HeaderAreas {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(LOGO_WIDTH),
            Constraint::Min(0),
            Constraint::Length(SEARCH_WIDTH.min(area.width.saturating_sub(LOGO_WIDTH))),
            Constraint::Length(1),
        ])
        .split(area);
    HeaderAreas {
        logo: Rect {
            x: cols[0].x + 1,
            y: cols[0].y + 1,
            width: LOGO.width() as u16,
            height: 1,
        }
        .intersection(area),
        search: cols[2],
    }
}

pub fn draw_logo(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(Span::styled(
            LOGO,
            Style::default().fg(C_LOGO).add_modifier(Modifier::BOLD),
        )),
        area,
    );
}

// ── Suggestion dropdown ───────────────────────────────────────────────────────

/// Overlay area directly under the search box, clipped to `screen`.
pub fn dropdown_area(search: Rect, rows: usize, screen: Rect) -> Rect {
    let height = rows as u16 * SUGGESTION_ROW_HEIGHT + 2;
    Rect {
        x: search.x,
        y: search.y + search.height,
        width: search.width,
        height,
    }
    .intersection(screen)
}

/// Draw the suggestion list and return one hit rect per visible row.
pub fn draw_dropdown(
    frame: &mut Frame,
    area: Rect,
    suggestions: &[SuggestionItem],
    highlight: Option<usize>,
    image_base: &str,
) -> Vec<Rect> {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(style_border(true))
        .style(Style::default().bg(C_DROPDOWN_BG));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mut rows = Vec::with_capacity(suggestions.len());
    for (idx, item) in suggestions.iter().enumerate() {
        let y = inner.y + idx as u16 * SUGGESTION_ROW_HEIGHT;
        if y + SUGGESTION_ROW_HEIGHT > inner.y + inner.height {
            break;
        }
        let row = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: SUGGESTION_ROW_HEIGHT,
        };
        let selected = highlight == Some(idx);
        let title_style = if selected {
            style_selected_focused()
        } else {
            style_default()
        };
        let title = format!(" {}{}", display_title(&item.title), year_text(item.year()));
        let thumb = poster_url(item.poster_path.as_deref(), PosterSize::Thumb, image_base)
            .unwrap_or_else(|| "no poster".to_string());
        let lines = vec![
            Line::from(Span::styled(truncate(&title, width), title_style)),
            Line::from(Span::styled(
                truncate(&format!("   {}", thumb), width),
                Style::default().fg(C_POSTER),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), row);
        rows.push(row);
    }
    rows
}

// ── Body ──────────────────────────────────────────────────────────────────────

pub fn draw_loading(frame: &mut Frame, area: Rect) {
    let mid = Rect {
        y: area.y + area.height / 2,
        height: 1.min(area.height),
        ..area
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Fetching recommendations…",
            Style::default().fg(C_LOADING).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        mid,
    );
}

pub fn draw_results_label(frame: &mut Frame, area: Rect, label: &str) {
    let line = Line::from(vec![
        Span::styled(
            " Top recommendations based on your interest in ",
            style_secondary(),
        ),
        Span::styled(
            display_title(label),
            style_default().add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Lines for a single card in the hero banner.
pub fn hero_lines(item: &RecommendationItem, image_base: &str) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            display_title(&item.title),
            style_accent().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                item.year().map(|y| y.to_string()).unwrap_or_default(),
                style_secondary(),
            ),
            Span::raw("  "),
            Span::styled(format!("★ {:.1}", item.vote_average), Style::default().fg(C_RATING)),
            Span::raw("  "),
            Span::styled(format!("▲ {:.0}", item.popularity), style_muted()),
        ]),
    ];
    if let Some(url) = poster_url(item.poster_path.as_deref(), PosterSize::Hero, image_base) {
        lines.push(Line::from(Span::styled(url, Style::default().fg(C_POSTER))));
    }
    lines
}

pub fn draw_hero(frame: &mut Frame, area: Rect, items: &[RecommendationItem], image_base: &str) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    for (item, slot) in items.iter().zip(halves.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(style_border(false));
        frame.render_widget(
            Paragraph::new(hero_lines(item, image_base))
                .block(block)
                .wrap(Wrap { trim: true }),
            *slot,
        );
    }
}

/// Draw the genre bar and return one hit rect per tab.
pub fn draw_genre_tabs(
    frame: &mut Frame,
    area: Rect,
    tabs: &[&str],
    selected: usize,
    focused: bool,
) -> Vec<Rect> {
    let mut spans = Vec::new();
    let mut hits = Vec::with_capacity(tabs.len());
    let mut x = area.x + 1;
    spans.push(Span::raw(" "));
    for (idx, name) in tabs.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::styled(TAB_SEPARATOR, style_muted()));
            x += TAB_SEPARATOR.width() as u16;
        }
        let style = match (idx == selected, focused) {
            (true, true) => style_selected_focused(),
            (true, false) => style_accent(),
            _ => style_secondary(),
        };
        let width = name.width() as u16;
        hits.push(
            Rect {
                x,
                y: area.y,
                width,
                height: 1,
            }
            .intersection(area),
        );
        x += width;
        spans.push(Span::styled(name.to_string(), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    hits
}

/// Two lines per card: title row, then poster URL.
pub fn card_lines(
    rank: usize,
    item: &RecommendationItem,
    image_base: &str,
    width: usize,
) -> [Line<'static>; 2] {
    let title = format!(
        "{:>3}. {}{}",
        rank,
        display_title(&item.title),
        year_text(item.year())
    );
    let meta = format!("  ★ {:.1}  ▲ {:.0}", item.vote_average, item.popularity);
    let title_room = width.saturating_sub(meta.width());
    let poster = poster_url(item.poster_path.as_deref(), PosterSize::Card, image_base)
        .unwrap_or_default();
    [
        Line::from(vec![
            Span::styled(truncate(&title, title_room), style_default()),
            Span::styled(meta, Style::default().fg(C_RATING)),
        ]),
        Line::from(Span::styled(
            truncate(&format!("      {}", poster), width),
            Style::default().fg(C_POSTER),
        )),
    ]
}

/// Draw a titled list of cards starting at card `scroll`. `first_rank` is the
/// display number of the first item.
#[allow(clippy::too_many_arguments)]
pub fn draw_movie_grid(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    items: &[RecommendationItem],
    first_rank: usize,
    scroll: usize,
    focused: bool,
    image_base: &str,
) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(style_border(focused))
        .title(Span::styled(
            format!(" {} ", title),
            style_default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" Nothing here yet.", style_muted())),
            inner,
        );
        return;
    }

    let width = inner.width as usize;
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(scroll)
        .flat_map(|(idx, item)| card_lines(first_rank + idx, item, image_base, width))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}
