//! View state and the transitions that change it.
//!
//! The store never exposes raw mutation. Fetch-bearing transitions hand out
//! a `RequestTicket`; only the ticket of the newest transition may commit
//! results or clear the loading flag.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cine_proto::model::RecommendationItem;
use cine_proto::nav::{Location, NavigationParams, QueryKind};

use crate::controller::ControllerEvent;
use crate::gateway::{FetchError, ListEndpoint, SharedApi};

const HERO_LEN: usize = 2;
const GRID_END: usize = 12;
const LATEST_STRIP_LEN: usize = 10;

/// An ordered list of recommendations and the query that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub label: String,
    pub kind: QueryKind,
    pub items: Vec<RecommendationItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Home,
    Results,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    hero: Vec<RecommendationItem>,
    active: Option<ResultSet>,
    loading: bool,
    latest: Vec<RecommendationItem>,
}

impl ViewState {
    pub fn hero_items(&self) -> &[RecommendationItem] {
        &self.hero
    }

    pub fn active(&self) -> Option<&ResultSet> {
        self.active.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_query_label(&self) -> Option<&str> {
        self.active().map(|set| set.label.as_str())
    }

    pub fn latest_items(&self) -> &[RecommendationItem] {
        &self.latest
    }

    /// The two banner slots, only when both can be filled.
    pub fn hero_banner(&self) -> Option<&[RecommendationItem]> {
        let hero = self.hero_items();
        (hero.len() >= HERO_LEN).then(|| &hero[..HERO_LEN])
    }

    /// Cards below the banner: the banner already shows the first two.
    pub fn result_grid(&self) -> &[RecommendationItem] {
        match self.active() {
            Some(set) => {
                let end = set.items.len().min(GRID_END);
                let start = HERO_LEN.min(end);
                &set.items[start..end]
            }
            None => &[],
        }
    }

    pub fn latest_strip(&self) -> &[RecommendationItem] {
        let latest = self.latest_items();
        &latest[..latest.len().min(LATEST_STRIP_LEN)]
    }

    pub fn screen(&self) -> Screen {
        if self.is_loading() {
            Screen::Loading
        } else if self.active().is_some() {
            Screen::Results
        } else {
            Screen::Home
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

/// Who asked for a transition. Only user actions write history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeFeed {
    TopRated,
    Latest,
}

/// Outcome of a results completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// New result set installed. `push` is the location to record, if any.
    Applied { push: Option<Location> },
    /// Successful response with nothing in it; previous state kept.
    Empty { label: String },
    Failed { label: String, message: String },
    /// The fetch task went away without answering.
    Cancelled,
    /// A newer transition (or a reset) superseded this ticket.
    Stale,
}

struct PendingRequest {
    ticket: RequestTicket,
    params: NavigationParams,
    origin: Origin,
}

pub struct ViewStore {
    api: SharedApi,
    events: mpsc::Sender<ControllerEvent>,
    shutdown: CancellationToken,
    state: ViewState,
    next_ticket: u64,
    pending: Option<PendingRequest>,
    home_feeds_started: bool,
    // Set once a results commit has filled the banner; the top-rated home
    // feed must not overwrite it afterwards.
    hero_from_results: bool,
}

impl ViewStore {
    pub fn new(
        api: SharedApi,
        events: mpsc::Sender<ControllerEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            api,
            events,
            shutdown,
            state: ViewState::default(),
            next_ticket: 0,
            pending: None,
            home_feeds_started: false,
            hero_from_results: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Fire the top-rated and latest fetches. Only the first call does
    /// anything.
    pub fn load_home_feeds(&mut self) {
        if self.home_feeds_started {
            return;
        }
        self.home_feeds_started = true;

        for (feed, endpoint) in [
            (HomeFeed::TopRated, ListEndpoint::TopRated),
            (HomeFeed::Latest, ListEndpoint::Latest),
        ] {
            let api = self.api.clone();
            let events = self.events.clone();
            let token = self.shutdown.child_token();
            tokio::spawn(async move {
                let result = api.fetch_list(endpoint, &token).await;
                let _ = events
                    .send(ControllerEvent::HomeFeedLoaded { feed, result })
                    .await;
            });
        }
    }

    pub fn on_home_feed(
        &mut self,
        feed: HomeFeed,
        result: Result<Vec<RecommendationItem>, FetchError>,
    ) {
        match (feed, result) {
            (_, Err(e)) if e.is_cancelled() => {}
            (feed, Err(e)) => warn!("failed to load {:?} feed: {}", feed, e),
            (HomeFeed::TopRated, Ok(items)) => {
                if self.hero_from_results {
                    debug!("top-rated feed arrived after a search; banner kept");
                } else {
                    self.state.hero = items;
                }
            }
            (HomeFeed::Latest, Ok(items)) => self.state.latest = items,
        }
    }

    /// Blank titles are ignored and return `None`.
    pub fn submit_movie_search(&mut self, title: &str) -> Option<RequestTicket> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(self.begin(NavigationParams::movie(title), Origin::User))
    }

    pub fn select_genre_tab(&mut self, name: &str) -> RequestTicket {
        self.begin(NavigationParams::genre(name), Origin::User)
    }

    /// Same fetch and assignment as the user transitions, but never writes
    /// history.
    pub fn restore_from_navigation(&mut self, params: NavigationParams) -> RequestTicket {
        self.begin(params, Origin::Navigation)
    }

    /// Drop the active result set and return the location to push.
    pub fn reset_to_home(&mut self) -> Location {
        self.local_reset();
        Location::home()
    }

    /// Reset without a history write, used when navigation lands on home.
    pub fn local_reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("reset supersedes request for {:?}", pending.params.query);
        }
        self.state.active = None;
        self.state.loading = false;
    }

    fn begin(&mut self, params: NavigationParams, origin: Origin) -> RequestTicket {
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        info!("loading {} {:?} ({:?})", params.kind, params.query, origin);

        self.state.loading = true;
        self.pending = Some(PendingRequest {
            ticket,
            params: params.clone(),
            origin,
        });

        let api = self.api.clone();
        let token = self.shutdown.child_token();
        let guard = CompletionGuard::new(self.events.clone(), ticket);
        tokio::spawn(async move {
            let result = match params.kind {
                QueryKind::Movie => api
                    .fetch_recommendations(&params.query, &token)
                    .await
                    .map(|resp| resp.into_items()),
                QueryKind::Genre => {
                    api.fetch_list(ListEndpoint::for_tab(&params.query), &token)
                        .await
                }
            };
            guard.complete(result).await;
        });

        ticket
    }

    pub fn on_results(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<RecommendationItem>, FetchError>,
    ) -> Commit {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                debug!("discarding stale response {:?}", ticket);
                return Commit::Stale;
            }
        };
        self.state.loading = false;
        let label = pending.params.query.clone();

        match result {
            Ok(items) if items.is_empty() => {
                info!("no results for {:?}", label);
                Commit::Empty { label }
            }
            Ok(items) => {
                info!("{} results for {:?}", items.len(), label);
                self.state.hero = items.clone();
                self.hero_from_results = true;
                self.state.active = Some(ResultSet {
                    label,
                    kind: pending.params.kind,
                    items,
                });
                let push = match pending.origin {
                    Origin::User => Some(Location::from(&pending.params)),
                    Origin::Navigation => None,
                };
                Commit::Applied { push }
            }
            Err(FetchError::Cancelled) => Commit::Cancelled,
            Err(e) => {
                warn!("loading {:?} failed: {}", label, e);
                Commit::Failed {
                    label,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Reports a fetch completion exactly once. If the task is dropped before
/// `complete` runs, a `Cancelled` result is sent instead so loading cannot
/// stay stuck.
pub struct CompletionGuard {
    events: Option<mpsc::Sender<ControllerEvent>>,
    ticket: RequestTicket,
}

impl CompletionGuard {
    pub fn new(events: mpsc::Sender<ControllerEvent>, ticket: RequestTicket) -> Self {
        Self {
            events: Some(events),
            ticket,
        }
    }

    pub async fn complete(mut self, result: Result<Vec<RecommendationItem>, FetchError>) {
        if let Some(events) = self.events.take() {
            let _ = events
                .send(ControllerEvent::ResultsLoaded {
                    ticket: self.ticket,
                    result,
                })
                .await;
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(events) = self.events.take() {
            warn!("fetch for {:?} ended without a result", self.ticket);
            let _ = events.try_send(ControllerEvent::ResultsLoaded {
                ticket: self.ticket,
                result: Err(FetchError::Cancelled),
            });
        }
    }
}
