//! Controller: single owner of query, suggestions, dropdown, view state and
//! history.
//!
//! Background tasks never touch state. They report through `ControllerEvent`
//! on the channel returned by `Controller::new`, and the owning loop feeds
//! each event back through `handle_event`.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cine_proto::config::SearchConfig;
use cine_proto::model::{display_title, RecommendationItem, SuggestionItem};
use cine_proto::nav::{Location, NavigationParams};

use crate::dropdown::Dropdown;
use crate::gateway::{FetchError, SharedApi};
use crate::history::{History, HistorySync, ScrollMode, SessionHistory, SyncAction};
use crate::suggest::{SuggestUpdate, SuggestionSearcher, TaskId};
use crate::view_state::{Commit, HomeFeed, RequestTicket, ViewState, ViewStore};

const EVENT_CAPACITY: usize = 1024;

/// Completions reported by background tasks.
#[derive(Debug)]
pub enum ControllerEvent {
    SuggestTimerFired {
        id: TaskId,
    },
    SuggestionsLoaded {
        id: TaskId,
        result: Result<Vec<SuggestionItem>, FetchError>,
    },
    HomeFeedLoaded {
        feed: HomeFeed,
        result: Result<Vec<RecommendationItem>, FetchError>,
    },
    ResultsLoaded {
        ticket: RequestTicket,
        result: Result<Vec<RecommendationItem>, FetchError>,
    },
}

/// User-facing message produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

pub struct Controller {
    query: String,
    searcher: SuggestionSearcher,
    dropdown: Dropdown,
    store: ViewStore,
    history: SessionHistory,
    sync: HistorySync,
    notices: Vec<Notice>,
    scroll_reset: bool,
    shutdown: CancellationToken,
}

impl Controller {
    pub fn new(
        api: SharedApi,
        search: &SearchConfig,
        initial: Location,
    ) -> (Self, mpsc::Receiver<ControllerEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let shutdown = CancellationToken::new();
        let controller = Self {
            query: String::new(),
            searcher: SuggestionSearcher::new(api.clone(), tx.clone(), shutdown.clone(), search),
            dropdown: Dropdown::default(),
            store: ViewStore::new(api, tx, shutdown.clone()),
            history: SessionHistory::new(initial),
            sync: HistorySync::new(),
            notices: Vec::new(),
            scroll_reset: false,
            shutdown,
        };
        (controller, rx)
    }

    /// Fire the home feeds and give the launch location its first
    /// observation, unless a user transition already moved past it.
    pub fn mount(&mut self) {
        info!("mounting at {}", self.history.current());
        self.store.load_home_feeds();
        if !self.sync.awaiting_first_observation() {
            return;
        }
        let location = self.history.current().clone();
        let action = self.sync.observe(&location);
        self.apply_sync(action);
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[SuggestionItem] {
        self.searcher.suggestions()
    }

    pub fn is_searching(&self) -> bool {
        self.searcher.is_busy()
    }

    pub fn dropdown(&self) -> &Dropdown {
        &self.dropdown
    }

    pub fn view(&self) -> &ViewState {
        self.store.state()
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// True once after landing on an entry that asks for a fresh viewport.
    pub fn take_scroll_reset(&mut self) -> bool {
        std::mem::take(&mut self.scroll_reset)
    }

    // ── Search box ────────────────────────────────────────────────────────────

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        let update = self.searcher.on_query_changed(&self.query);
        self.apply_suggest_update(update);
    }

    /// Enter: pick the highlighted row if there is one, otherwise submit the
    /// typed text.
    pub fn accept(&mut self) {
        match self.dropdown.highlight() {
            Some(index) => self.pick_suggestion(index),
            None => self.submit_search(),
        }
    }

    pub fn submit_search(&mut self) {
        let title = self.query.trim().to_string();
        if title.is_empty() {
            return;
        }
        self.searcher.clear();
        self.dropdown.close();
        self.store.submit_movie_search(&title);
    }

    /// Fill the box with the picked title, close, then search for exactly
    /// that title. No suggestion search is started for the new text.
    pub fn pick_suggestion(&mut self, index: usize) {
        let Some(title) = self.suggestions().get(index).map(|s| s.title.clone()) else {
            return;
        };
        if self.dropdown.pick(index).is_none() {
            return;
        }
        debug!("picked suggestion {:?}", title);
        self.query = title;
        self.searcher.clear();
        self.store.submit_movie_search(&self.query);
    }

    pub fn highlight_next(&mut self) {
        self.dropdown.highlight_next();
    }

    pub fn highlight_prev(&mut self) {
        self.dropdown.highlight_prev();
    }

    pub fn hover_suggestion(&mut self, index: usize) {
        self.dropdown.hover(index);
    }

    pub fn dismiss_suggestions(&mut self) {
        self.dropdown.close();
    }

    /// Show the last list again when the search box regains focus.
    pub fn reopen_suggestions(&mut self) {
        if !self.dropdown.is_open() && !self.query.trim().is_empty() {
            self.dropdown.open(self.searcher.suggestions().len());
        }
    }

    // ── View transitions ──────────────────────────────────────────────────────

    pub fn select_genre(&mut self, name: &str) {
        self.dropdown.close();
        self.store.select_genre_tab(name);
    }

    pub fn reset_to_home(&mut self) {
        self.query.clear();
        self.searcher.clear();
        self.dropdown.close();
        let home = self.store.reset_to_home();
        self.sync.push(&mut self.history, home);
        self.drain_history();
    }

    pub fn restore_from_navigation(&mut self, params: NavigationParams) {
        self.store.restore_from_navigation(params);
    }

    pub fn navigate_back(&mut self) -> bool {
        let moved = self.history.back().is_some();
        self.drain_history();
        moved
    }

    pub fn navigate_forward(&mut self) -> bool {
        let moved = self.history.forward().is_some();
        self.drain_history();
        moved
    }

    // ── Completions ───────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::SuggestTimerFired { id } => self.searcher.on_timer_fired(id),
            ControllerEvent::SuggestionsLoaded { id, result } => {
                let update = self.searcher.on_response(id, result);
                self.apply_suggest_update(update);
            }
            ControllerEvent::HomeFeedLoaded { feed, result } => {
                self.store.on_home_feed(feed, result)
            }
            ControllerEvent::ResultsLoaded { ticket, result } => {
                let commit = self.store.on_results(ticket, result);
                self.apply_commit(commit);
            }
        }
    }

    fn apply_suggest_update(&mut self, update: SuggestUpdate) {
        match update {
            SuggestUpdate::Show(len) => self.dropdown.open(len),
            SuggestUpdate::Hide => self.dropdown.close(),
            SuggestUpdate::Unchanged => {}
        }
    }

    fn apply_commit(&mut self, commit: Commit) {
        match commit {
            Commit::Applied { push: Some(location) } => {
                self.sync.push(&mut self.history, location);
                self.drain_history();
            }
            Commit::Applied { push: None } | Commit::Cancelled | Commit::Stale => {}
            Commit::Empty { label } => self.notices.push(Notice::Info(format!(
                "No recommendations for \"{}\"",
                display_title(&label)
            ))),
            Commit::Failed { label, message } => self.notices.push(Notice::Error(format!(
                "Couldn't load \"{}\": {}",
                display_title(&label),
                message
            ))),
        }
    }

    fn apply_sync(&mut self, action: SyncAction) {
        match action {
            SyncAction::Restore(params) => self.restore_from_navigation(params),
            SyncAction::LocalReset => self.store.local_reset(),
            SyncAction::None => {}
        }
    }

    fn drain_history(&mut self) {
        while let Some(change) = self.history.take_change() {
            if change.scroll == ScrollMode::Reset {
                self.scroll_reset = true;
            }
            let action = self.sync.observe(&change.location);
            debug!(
                "location {} -> {:?} ({} entries)",
                change.location,
                action,
                self.history.len()
            );
            self.apply_sync(action);
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use crate::gateway::ListEndpoint;
    use crate::testing::{movies, settle, suggestion, Call, FakeApi};
    use crate::view_state::Screen;

    fn controller(
        api: &Arc<FakeApi>,
        location: &str,
    ) -> (Controller, mpsc::Receiver<ControllerEvent>) {
        Controller::new(api.clone(), &SearchConfig::default(), Location::parse(location))
    }

    fn recommend_calls(api: &FakeApi) -> usize {
        api.calls()
            .iter()
            .filter(|c| matches!(c, Call::Recommend(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn fast_typing_sends_one_suggestion_request() {
        let api = FakeApi::new();
        api.set_suggestions("Inception", vec![suggestion("Inception")]);
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("Incept");
        settle(&mut ctl, &mut rx, Duration::from_millis(100)).await;
        ctl.set_query("Inception");
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(api.calls(), vec![Call::Suggest("Inception".into())]);
        assert!(ctl.dropdown().is_open());
        assert_eq!(ctl.dropdown().highlight(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn top_rated_tab_uses_its_own_endpoint() {
        let api = FakeApi::new();
        api.set_list(ListEndpoint::TopRated, movies(&["Heat", "Ran", "Ikiru"]));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.select_genre("Top Rated");
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(api.calls(), vec![Call::List(ListEndpoint::TopRated)]);
        assert_eq!(ctl.location().as_str(), "/?q=Top+Rated&type=genre");
        assert_eq!(ctl.view().last_query_label(), Some("Top Rated"));
    }

    #[tokio::test(start_paused = true)]
    async fn transition_before_mount_fetches_once() {
        let api = FakeApi::new();
        api.set_list(ListEndpoint::Genre("Horror".into()), movies(&["Alien", "It"]));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.select_genre("Horror");
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        assert_eq!(api.calls(), vec![Call::List(ListEndpoint::Genre("Horror".into()))]);
        assert_eq!(ctl.location().as_str(), "/?q=Horror&type=genre");

        api.clear_calls();
        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        let calls = api.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls.contains(&Call::List(ListEndpoint::Genre("Horror".into()))));
        assert_eq!(ctl.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn revisiting_an_entry_restores_the_same_view() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario", "Enemy"]));
        let (mut ctl, mut rx) = controller(&api, "/");
        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_millis(10)).await;

        ctl.set_query("Dune");
        ctl.submit_search();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        let results = ctl.view().clone();

        let mut homes = Vec::new();
        let mut restored = Vec::new();
        for _ in 0..2 {
            assert!(ctl.navigate_back());
            settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
            homes.push(ctl.view().clone());

            assert!(ctl.navigate_forward());
            settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
            restored.push(ctl.view().clone());

            assert_eq!(ctl.history().len(), 2);
            assert!(!ctl.history().can_go_forward());
            assert_eq!(ctl.location().as_str(), "/?q=Dune&type=movie");
        }

        assert_eq!(homes[0], homes[1]);
        assert_eq!(homes[0].screen(), Screen::Home);
        assert_eq!(restored, vec![results.clone(), results]);
        assert_eq!(recommend_calls(&api), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn back_returns_home_without_fetching() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario", "Enemy"]));
        let (mut ctl, mut rx) = controller(&api, "/");
        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_millis(10)).await;

        ctl.set_query("Dune");
        ctl.submit_search();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        assert_eq!(ctl.history().len(), 2);
        assert_eq!(ctl.view().screen(), Screen::Results);

        api.clear_calls();
        assert!(ctl.navigate_back());
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert!(api.calls().is_empty());
        assert_eq!(ctl.view().screen(), Screen::Home);
        assert!(ctl.location().is_home());
        assert_eq!(ctl.view().hero_banner().unwrap()[0].title, "Arrival");

        assert!(ctl.navigate_forward());
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(api.calls(), vec![Call::Recommend("Dune".into())]);
        assert_eq!(ctl.view().last_query_label(), Some("Dune"));
        assert_eq!(ctl.history().len(), 2);
        assert!(!ctl.navigate_forward());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_input_while_suggestions_load_keeps_dropdown_closed() {
        let api = FakeApi::new();
        api.set_suggestions("bat", vec![suggestion("Batman"), suggestion("Bats")]);
        api.delay(Call::Suggest("bat".into()), Duration::from_secs(1));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("bat");
        settle(&mut ctl, &mut rx, Duration::from_millis(400)).await;
        ctl.set_query("");
        settle(&mut ctl, &mut rx, Duration::from_secs(3)).await;

        assert!(!ctl.dropdown().is_open());
        assert!(ctl.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loading_clears_on_failure_with_error_notice() {
        let api = FakeApi::new();
        api.fail(Call::Recommend("Dune".into()));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("Dune");
        ctl.submit_search();
        assert!(ctl.view().is_loading());
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert!(!ctl.view().is_loading());
        assert_eq!(ctl.view().screen(), Screen::Home);
        assert!(matches!(ctl.take_notices()[..], [Notice::Error(_)]));
        assert_eq!(ctl.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_recommendations_leave_view_alone() {
        let api = FakeApi::new();
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("zzzz");
        ctl.submit_search();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(
            ctl.take_notices(),
            vec![Notice::Info("No recommendations for \"Zzzz\"".into())]
        );
        assert!(ctl.location().is_home());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_results_do_not_commit_or_push() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario"]));
        api.set_list(ListEndpoint::Genre("Horror".into()), movies(&["Alien", "It"]));
        api.delay(Call::Recommend("Dune".into()), Duration::from_secs(1));
        api.delay(
            Call::List(ListEndpoint::Genre("Horror".into())),
            Duration::from_secs(3),
        );
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("Dune");
        ctl.submit_search();
        ctl.select_genre("Horror");
        settle(&mut ctl, &mut rx, Duration::from_secs(2)).await;

        assert!(ctl.view().is_loading());
        assert!(ctl.location().is_home());
        assert_eq!(ctl.view().screen(), Screen::Loading);

        settle(&mut ctl, &mut rx, Duration::from_secs(2)).await;
        assert!(!ctl.view().is_loading());
        assert_eq!(ctl.view().last_query_label(), Some("Horror"));
        assert_eq!(ctl.history().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_loading_wins() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario"]));
        api.delay(Call::Recommend("Dune".into()), Duration::from_secs(1));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("Dune");
        ctl.submit_search();
        ctl.reset_to_home();
        assert!(!ctl.view().is_loading());
        assert_eq!(ctl.query(), "");

        settle(&mut ctl, &mut rx, Duration::from_secs(2)).await;
        assert_eq!(ctl.view().screen(), Screen::Home);
        assert_eq!(ctl.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deep_link_restores_without_pushing() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario"]));
        let (mut ctl, mut rx) = controller(&api, "/?q=Dune&type=movie");

        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        let calls = api.calls();
        assert!(calls.contains(&Call::Recommend("Dune".into())));
        assert!(calls.contains(&Call::List(ListEndpoint::TopRated)));
        assert!(calls.contains(&Call::List(ListEndpoint::Latest)));
        assert_eq!(ctl.history().len(), 1);
        assert_eq!(ctl.view().last_query_label(), Some("Dune"));

        ctl.reset_to_home();
        assert!(ctl.navigate_back());
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        assert_eq!(recommend_calls(&api), 2);
        assert_eq!(ctl.view().last_query_label(), Some("Dune"));
    }

    #[tokio::test(start_paused = true)]
    async fn searching_a_deep_linked_title_does_not_duplicate_history() {
        let api = FakeApi::new();
        api.set_recommendations("Dune", movies(&["Arrival", "Sicario"]));
        let (mut ctl, mut rx) = controller(&api, "/?type=movie&q=Dune");
        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        ctl.set_query("Dune");
        ctl.submit_search();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(recommend_calls(&api), 2);
        assert_eq!(ctl.history().len(), 1);
        assert!(!ctl.history().can_go_back());
    }

    #[tokio::test(start_paused = true)]
    async fn plain_mount_only_loads_home_feeds() {
        let api = FakeApi::new();
        api.set_list(ListEndpoint::TopRated, movies(&["Heat", "Ran"]));
        api.set_list(ListEndpoint::Latest, movies(&["New"]));
        let (mut ctl, mut rx) = controller(&api, "/?q=Dune");

        ctl.mount();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert_eq!(recommend_calls(&api), 0);
        assert_eq!(api.calls().len(), 2);
        assert_eq!(ctl.view().screen(), Screen::Home);
        assert_eq!(ctl.view().hero_banner().unwrap()[1].title, "Ran");
        assert_eq!(ctl.view().latest_strip().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn picking_a_suggestion_searches_that_title_once() {
        let api = FakeApi::new();
        api.set_suggestions(
            "inc",
            vec![suggestion("Incendies"), suggestion("Inception")],
        );
        api.set_recommendations("Inception", movies(&["Tenet", "Memento"]));
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("inc");
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        assert!(ctl.dropdown().is_open());

        ctl.highlight_next();
        ctl.highlight_next();
        ctl.accept();
        assert_eq!(ctl.query(), "Inception");
        assert!(!ctl.dropdown().is_open());

        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        assert_eq!(
            api.calls(),
            vec![
                Call::Suggest("inc".into()),
                Call::Recommend("Inception".into())
            ]
        );
        assert_eq!(ctl.location().as_str(), "/?q=Inception&type=movie");
    }

    #[tokio::test(start_paused = true)]
    async fn enter_without_highlight_submits_typed_text() {
        let api = FakeApi::new();
        api.set_suggestions("heat", vec![suggestion("Heat")]);
        let (mut ctl, mut rx) = controller(&api, "/");

        ctl.set_query("heat");
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;
        ctl.accept();
        settle(&mut ctl, &mut rx, Duration::from_secs(1)).await;

        assert!(api.calls().contains(&Call::Recommend("heat".into())));
        assert!(!ctl.dropdown().is_open());
    }
}
