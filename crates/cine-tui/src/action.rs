//! Action enum: every user intent the shell can dispatch.

/// Focusable regions of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    SearchBox,
    GenreTabs,
    Results,
}

impl ComponentId {
    pub fn label(self) -> &'static str {
        match self {
            Self::SearchBox => "SEARCH",
            Self::GenreTabs => "GENRES",
            Self::Results => "BROWSE",
        }
    }
}

/// Key and mouse handlers produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Search box ───────────────────────────────────────────────────────────
    QueryChanged(String),
    Accept,
    HighlightNext,
    HighlightPrev,
    HoverSuggestion(usize),
    PickSuggestion(usize),
    DismissSuggestions,

    // ── View ─────────────────────────────────────────────────────────────────
    SelectGenre(String),
    TabLeft,
    TabRight,
    ActivateTab,
    GoHome,
    Back,
    Forward,

    // ── Layout ───────────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    ScrollUp(usize),
    ScrollDown(usize),

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
