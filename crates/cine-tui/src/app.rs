//! App: terminal event loop around the `Controller`.
//!
//! Architecture:
//! - `App` owns the controller plus the purely visual state (focus, search
//!   box widget, toasts, scroll offset, last-drawn hit areas).
//! - A blocking reader task forwards crossterm events over an mpsc channel.
//! - Controller completions arrive on their own channel and are drained in
//!   bursts before the next frame.
//! - Key and mouse handlers return `Vec<Action>`; App dispatches each Action.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    widgets::Block,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use cine_proto::model::RecommendationItem;

use crate::action::{Action, ComponentId};
use crate::controller::{Controller, ControllerEvent, Notice};
use crate::focus::FocusRing;
use crate::gateway::GENRE_TABS;
use crate::pointer::{OutsideClickSubscription, PointerHub};
use crate::theme::C_BG;
use crate::ui;
use crate::view_state::Screen;
use crate::widgets::{
    search_input::{SearchAction, SearchInput},
    status_bar::{self, StatusInfo},
    toast::ToastManager,
};

const INPUT_POLL: Duration = Duration::from_millis(200);
const HERO_HEIGHT: u16 = 6;
const MAX_DRAIN: usize = 256;

// ── Pane area tracking ────────────────────────────────────────────────────────

/// Last-drawn layout rects, used by `handle_mouse` for hit-testing.
#[derive(Default, Clone)]
struct PaneAreas {
    screen: Rect,
    logo: Rect,
    search: Rect,
    dropdown: Rect,
    suggestion_rows: Vec<Rect>,
    tabs: Vec<Rect>,
    results: Rect,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    controller: Controller,
    search: SearchInput,
    focus: FocusRing,
    toast: ToastManager,
    pointer: PointerHub,
    /// Held only while the dropdown is open.
    outside_click: Option<OutsideClickSubscription>,
    areas: PaneAreas,
    tab_index: usize,
    scroll: usize,
    image_base: String,
    should_quit: bool,
}

impl App {
    pub fn new(controller: Controller, image_base: impl Into<String>) -> Self {
        Self {
            controller,
            search: SearchInput::default(),
            focus: FocusRing::default(),
            toast: ToastManager::new(),
            pointer: PointerHub::new(),
            outside_click: None,
            areas: PaneAreas::default(),
            tab_index: 0,
            scroll: 0,
            image_base: image_base.into(),
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        controller_rx: mpsc::Receiver<ControllerEvent>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let result = self.event_loop(&mut terminal, controller_rx).await;

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        mut controller_rx: mpsc::Receiver<ControllerEvent>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(1024);

        // ── Background task: keyboard/mouse events ────────────────────────────
        tokio::task::spawn_blocking(move || loop {
            if tx.is_closed() {
                break;
            }
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        });

        self.controller.mount();
        info!("cinematch ready");

        // Toast expiry check
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if std::mem::take(&mut needs_redraw) {
                terminal.draw(|f| self.draw(f))?;
            }

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(ev) = rx.recv() => {
                    self.handle_terminal_event(ev);
                    needs_redraw = true;
                }

                Some(event) = controller_rx.recv() => {
                    self.controller.handle_event(event);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        match controller_rx.try_recv() {
                            Ok(next) => self.controller.handle_event(next),
                            Err(_) => break,
                        }
                        drained += 1;
                    }
                    self.absorb();
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    needs_redraw = self.toast.tick();
                }

                else => break,
            }
        }

        Ok(())
    }

    fn handle_terminal_event(&mut self, ev: Event) {
        let actions = match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => Vec::new(),
        };
        for action in actions {
            self.dispatch(action);
        }
        self.absorb();
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // Global keys, active regardless of focus
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            match key.code {
                KeyCode::Left => return vec![Action::Back],
                KeyCode::Right => return vec![Action::Forward],
                _ => {}
            }
        }
        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            _ => {}
        }

        match self.focus.current() {
            Some(ComponentId::SearchBox) => match key.code {
                KeyCode::Down => vec![Action::HighlightNext],
                KeyCode::Up => vec![Action::HighlightPrev],
                KeyCode::Esc if self.controller.dropdown().is_open() => {
                    vec![Action::DismissSuggestions]
                }
                _ => match self.search.handle_key(key) {
                    SearchAction::Changed(text) => vec![Action::QueryChanged(text)],
                    SearchAction::Submitted => vec![Action::Accept],
                    SearchAction::None => vec![],
                },
            },
            Some(focused) => {
                let tabs = focused == ComponentId::GenreTabs;
                match key.code {
                    KeyCode::Char('q') => vec![Action::Quit],
                    KeyCode::Char('/') => vec![Action::FocusPane(ComponentId::SearchBox)],
                    KeyCode::Char('h') => vec![Action::GoHome],
                    KeyCode::Char('[') => vec![Action::Back],
                    KeyCode::Char(']') => vec![Action::Forward],
                    KeyCode::Left if tabs => vec![Action::TabLeft],
                    KeyCode::Right if tabs => vec![Action::TabRight],
                    KeyCode::Enter | KeyCode::Char(' ') if tabs => vec![Action::ActivateTab],
                    KeyCode::Up | KeyCode::Char('k') => vec![Action::ScrollUp(1)],
                    KeyCode::Down | KeyCode::Char('j') => vec![Action::ScrollDown(1)],
                    KeyCode::PageUp => vec![Action::ScrollUp(5)],
                    KeyCode::PageDown => vec![Action::ScrollDown(5)],
                    _ => vec![],
                }
            }
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let at = Position::new(event.column, event.row);
        let areas = &self.areas;
        let dropdown_open = self.controller.dropdown().is_open();
        let row_at = |at: Position| areas.suggestion_rows.iter().position(|r| r.contains(at));

        match event.kind {
            MouseEventKind::Moved if dropdown_open => {
                row_at(at).map(Action::HoverSuggestion).into_iter().collect()
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let mut actions = Vec::new();
                if let Some(sub) = &self.outside_click {
                    if self.pointer.dispatch(at).contains(&sub.id()) {
                        actions.push(Action::DismissSuggestions);
                    }
                }
                if dropdown_open {
                    if let Some(idx) = row_at(at) {
                        actions.push(Action::PickSuggestion(idx));
                        return actions;
                    }
                    if areas.dropdown.contains(at) {
                        return actions;
                    }
                }

                if areas.logo.contains(at) {
                    actions.push(Action::GoHome);
                } else if let Some(idx) = areas.tabs.iter().position(|r| r.contains(at)) {
                    actions.push(Action::FocusPane(ComponentId::GenreTabs));
                    actions.push(Action::SelectGenre(GENRE_TABS[idx].to_string()));
                } else if areas.search.contains(at) {
                    actions.push(Action::FocusPane(ComponentId::SearchBox));
                } else if areas.results.contains(at) {
                    actions.push(Action::FocusPane(ComponentId::Results));
                }
                actions
            }
            MouseEventKind::ScrollUp if areas.results.contains(at) => vec![Action::ScrollUp(1)],
            MouseEventKind::ScrollDown if areas.results.contains(at) => {
                vec![Action::ScrollDown(1)]
            }
            _ => Vec::new(),
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        match &action {
            Action::HoverSuggestion(_) | Action::ScrollUp(_) | Action::ScrollDown(_) => {}
            _ => debug!("dispatch: {:?}", action),
        }
        match action {
            // ── Search box ────────────────────────────────────────────────────
            Action::QueryChanged(text) => self.controller.set_query(text),
            Action::Accept => self.controller.accept(),
            Action::HighlightNext => self.controller.highlight_next(),
            Action::HighlightPrev => self.controller.highlight_prev(),
            Action::HoverSuggestion(idx) => self.controller.hover_suggestion(idx),
            Action::PickSuggestion(idx) => self.controller.pick_suggestion(idx),
            Action::DismissSuggestions => self.controller.dismiss_suggestions(),

            // ── View ──────────────────────────────────────────────────────────
            Action::SelectGenre(name) => {
                if let Some(pos) = GENRE_TABS.iter().position(|t| *t == name) {
                    self.tab_index = pos;
                }
                self.scroll = 0;
                self.controller.select_genre(&name);
            }
            Action::TabLeft => {
                self.tab_index = (self.tab_index + GENRE_TABS.len() - 1) % GENRE_TABS.len();
            }
            Action::TabRight => {
                self.tab_index = (self.tab_index + 1) % GENRE_TABS.len();
            }
            Action::ActivateTab => {
                self.scroll = 0;
                self.controller.select_genre(GENRE_TABS[self.tab_index]);
            }
            Action::GoHome => {
                self.scroll = 0;
                self.controller.reset_to_home();
            }
            Action::Back => {
                self.controller.navigate_back();
            }
            Action::Forward => {
                self.controller.navigate_forward();
            }

            // ── Layout ────────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
                self.on_focus_changed();
            }
            Action::FocusPrev => {
                self.focus.prev();
                self.on_focus_changed();
            }
            Action::FocusPane(id) => {
                self.focus.set(id);
                self.on_focus_changed();
            }
            Action::ScrollUp(n) => self.scroll = self.scroll.saturating_sub(n),
            Action::ScrollDown(n) => {
                let max = self.grid_items().len().saturating_sub(1);
                self.scroll = (self.scroll + n).min(max);
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => self.should_quit = true,
        }
    }

    fn on_focus_changed(&mut self) {
        if self.focus.is_focused(ComponentId::SearchBox) {
            self.controller.reopen_suggestions();
        } else {
            self.controller.dismiss_suggestions();
        }
    }

    /// Pull everything the controller produced since the last call into the
    /// visual state.
    fn absorb(&mut self) {
        if self.search.text() != self.controller.query() {
            self.search.set_value(self.controller.query());
        }

        for notice in self.controller.take_notices() {
            match notice {
                Notice::Info(msg) => self.toast.info(msg),
                Notice::Error(msg) => self.toast.error(msg),
            }
        }

        if self.controller.take_scroll_reset() {
            self.scroll = 0;
        }

        match self.controller.view().screen() {
            Screen::Home => self.focus.set_items(vec![
                ComponentId::SearchBox,
                ComponentId::GenreTabs,
                ComponentId::Results,
            ]),
            Screen::Results => {
                let was_tabs = self.focus.is_focused(ComponentId::GenreTabs);
                self.focus
                    .set_items(vec![ComponentId::SearchBox, ComponentId::Results]);
                if was_tabs {
                    self.focus.set(ComponentId::Results);
                }
            }
            Screen::Loading => {}
        }
        let max = self.grid_items().len().saturating_sub(1);
        self.scroll = self.scroll.min(max);

        match (self.controller.dropdown().is_open(), self.outside_click.is_some()) {
            (true, false) => {
                let rows = self.controller.suggestions().len();
                let area = self
                    .areas
                    .search
                    .union(ui::dropdown_area(self.areas.search, rows, self.areas.screen));
                self.outside_click = Some(self.pointer.subscribe(area));
            }
            (false, true) => self.outside_click = None,
            _ => {}
        }
    }

    fn grid_items(&self) -> &[RecommendationItem] {
        let view = self.controller.view();
        match view.screen() {
            Screen::Results => view.result_grid(),
            Screen::Home => view.latest_strip(),
            Screen::Loading => &[],
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        // ── Header ────────────────────────────────────────────────────────────
        let header = ui::header_layout(outer[0]);
        ui::draw_logo(frame, header.logo);
        self.search.draw(
            frame,
            header.search,
            self.focus.is_focused(ComponentId::SearchBox),
            self.controller.is_searching(),
        );
        status_bar::draw_separator(frame, outer[1]);

        // ── Body ──────────────────────────────────────────────────────────────
        let body = outer[2];
        let results_focused = self.focus.is_focused(ComponentId::Results);
        let view = self.controller.view();
        let hero_h = if view.hero_banner().is_some() { HERO_HEIGHT } else { 0 };
        let mut tabs = Vec::new();
        let mut results = Rect::default();

        match view.screen() {
            Screen::Loading => ui::draw_loading(frame, body),
            Screen::Home => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(hero_h),
                        Constraint::Length(1),
                        Constraint::Length(1),
                        Constraint::Min(0),
                    ])
                    .split(body);
                if let Some(banner) = view.hero_banner() {
                    ui::draw_hero(frame, rows[0], banner, &self.image_base);
                }
                tabs = ui::draw_genre_tabs(
                    frame,
                    rows[1],
                    GENRE_TABS,
                    self.tab_index,
                    self.focus.is_focused(ComponentId::GenreTabs),
                );
                results = rows[3];
                ui::draw_movie_grid(
                    frame,
                    results,
                    "Latest (2025)",
                    view.latest_strip(),
                    1,
                    self.scroll,
                    results_focused,
                    &self.image_base,
                );
            }
            Screen::Results => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Length(hero_h),
                        Constraint::Min(0),
                    ])
                    .split(body);
                if let Some(label) = view.last_query_label() {
                    ui::draw_results_label(frame, rows[0], label);
                }
                if let Some(banner) = view.hero_banner() {
                    ui::draw_hero(frame, rows[1], banner, &self.image_base);
                }
                results = rows[2];
                ui::draw_movie_grid(
                    frame,
                    results,
                    "More like this",
                    view.result_grid(),
                    3,
                    self.scroll,
                    results_focused,
                    &self.image_base,
                );
            }
        }

        // ── Status bar ────────────────────────────────────────────────────────
        let history = self.controller.history();
        status_bar::draw_status_bar(
            frame,
            outer[3],
            &StatusInfo {
                focus: self.focus.current(),
                location: self.controller.location(),
                can_go_back: history.can_go_back(),
                can_go_forward: history.can_go_forward(),
            },
        );

        // ── Suggestion dropdown (overlay) ─────────────────────────────────────
        let dropdown = self.controller.dropdown();
        let (dropdown_area, suggestion_rows) = if dropdown.is_open() {
            let suggestions = self.controller.suggestions();
            let overlay = ui::dropdown_area(header.search, suggestions.len(), area);
            let rows = ui::draw_dropdown(
                frame,
                overlay,
                suggestions,
                dropdown.highlight(),
                &self.image_base,
            );
            (overlay, rows)
        } else {
            (Rect::default(), Vec::new())
        };
        if let Some(sub) = &self.outside_click {
            sub.set_area(header.search.union(dropdown_area));
        }

        // ── Toast notifications (topmost layer) ───────────────────────────────
        self.toast.draw(frame, area);

        self.areas = PaneAreas {
            screen: area,
            logo: header.logo,
            search: header.search,
            dropdown: dropdown_area,
            suggestion_rows,
            tabs,
            results,
        };
    }
}
