//! Debounced suggestion searcher.
//!
//! ```text
//!  Idle ──query──▶ Pending ──timer──▶ (request in flight) ──▶ Resolved
//!   ▲                 │                                  ├──▶ Cancelled
//!   └──empty query────┘                                  └──▶ Errored
//! ```
//!
//! Each keystroke replaces the debounce timer. When a timer fires, the
//! previous in-flight request is cancelled and a fresh one is issued, so at
//! most one suggestion request is ever live. Responses are matched against
//! the live task id; anything else is a late arrival and is dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cine_proto::config::SearchConfig;
use cine_proto::model::SuggestionItem;

use crate::controller::ControllerEvent;
use crate::gateway::{FetchError, SharedApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// A cancellable debounce-then-fetch task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    query: String,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Pending,
    Resolved,
    Cancelled,
    Errored,
}

/// What the dropdown should do after a searcher step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestUpdate {
    Show(usize),
    Hide,
    Unchanged,
}

pub struct SuggestionSearcher {
    api: SharedApi,
    events: mpsc::Sender<ControllerEvent>,
    shutdown: CancellationToken,
    debounce: Duration,
    max_results: usize,
    next_id: u64,
    /// Debounce timer waiting to fire.
    timer: Option<TaskHandle>,
    /// Request issued by the last timer that fired.
    inflight: Option<TaskHandle>,
    phase: SearchPhase,
    suggestions: Vec<SuggestionItem>,
}

impl SuggestionSearcher {
    pub fn new(
        api: SharedApi,
        events: mpsc::Sender<ControllerEvent>,
        shutdown: CancellationToken,
        config: &SearchConfig,
    ) -> Self {
        Self {
            api,
            events,
            shutdown,
            debounce: config.debounce(),
            max_results: config.max_suggestions,
            next_id: 0,
            timer: None,
            inflight: None,
            phase: SearchPhase::Idle,
            suggestions: Vec::new(),
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn suggestions(&self) -> &[SuggestionItem] {
        &self.suggestions
    }

    pub fn has_live_request(&self) -> bool {
        self.inflight.is_some()
    }

    /// Waiting on the debounce timer or on the network.
    pub fn is_busy(&self) -> bool {
        self.phase() == SearchPhase::Pending || self.has_live_request()
    }

    /// Feed the raw text of the search box.
    pub fn on_query_changed(&mut self, query: &str) -> SuggestUpdate {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.cancel_all();
            self.suggestions.clear();
            self.phase = SearchPhase::Idle;
            return SuggestUpdate::Hide;
        }

        if let Some(previous) = self.timer.take() {
            self.cancel(&previous);
        }
        self.timer = Some(self.start_suggestion_task(trimmed));
        self.phase = SearchPhase::Pending;
        SuggestUpdate::Unchanged
    }

    /// Arm a debounce timer for `query`. The fetch itself is issued from
    /// `on_timer_fired` so that the swap of in-flight requests happens on
    /// the owning loop.
    pub fn start_suggestion_task(&mut self, query: &str) -> TaskHandle {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let token = self.shutdown.child_token();
        let timer_token = token.clone();
        let events = self.events.clone();
        let delay = self.debounce;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = events.send(ControllerEvent::SuggestTimerFired { id }).await;
                }
            }
        });

        TaskHandle {
            id,
            query: query.to_string(),
            token,
        }
    }

    pub fn cancel(&mut self, handle: &TaskHandle) {
        handle.cancel();
        if self.timer.as_ref().is_some_and(|t| t.id == handle.id) {
            self.timer = None;
        }
        if self.inflight.as_ref().is_some_and(|t| t.id == handle.id) {
            self.inflight = None;
        }
    }

    /// Cancel both the pending timer and the live request.
    pub fn cancel_all(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        if let Some(inflight) = self.inflight.take() {
            inflight.cancel();
        }
    }

    /// Hide the list without touching the text (pick or submission).
    pub fn clear(&mut self) {
        self.cancel_all();
        self.suggestions.clear();
        self.phase = SearchPhase::Idle;
    }

    pub fn on_timer_fired(&mut self, id: TaskId) {
        let handle = match self.timer.take() {
            Some(handle) if handle.id == id => handle,
            other => {
                // Replaced after the timer already queued its message.
                self.timer = other;
                return;
            }
        };

        if let Some(previous) = self.inflight.take() {
            debug!("cancelling suggestions for {:?}", previous.query);
            previous.cancel();
        }

        let api = self.api.clone();
        let events = self.events.clone();
        let query = handle.query.clone();
        let token = handle.token.clone();
        tokio::spawn(async move {
            let result = api.fetch_suggestions(&query, &token).await;
            let _ = events
                .send(ControllerEvent::SuggestionsLoaded { id, result })
                .await;
        });

        self.inflight = Some(handle);
    }

    pub fn on_response(
        &mut self,
        id: TaskId,
        result: Result<Vec<SuggestionItem>, FetchError>,
    ) -> SuggestUpdate {
        let handle = match self.inflight.take() {
            Some(handle) if handle.id == id => handle,
            other => {
                self.inflight = other;
                debug!("dropping superseded suggestion response");
                return SuggestUpdate::Unchanged;
            }
        };

        let settled = if self.timer.is_some() {
            SearchPhase::Pending
        } else {
            SearchPhase::Resolved
        };

        match result {
            Ok(items) => {
                self.suggestions = items.into_iter().take(self.max_results).collect();
                self.phase = settled;
                debug!(
                    "{} suggestions for {:?}",
                    self.suggestions.len(),
                    handle.query
                );
                if self.suggestions.is_empty() {
                    SuggestUpdate::Hide
                } else {
                    SuggestUpdate::Show(self.suggestions.len())
                }
            }
            Err(FetchError::Cancelled) => {
                self.phase = SearchPhase::Cancelled;
                SuggestUpdate::Unchanged
            }
            Err(e) => {
                warn!("suggestion search for {:?} failed: {}", handle.query, e);
                self.suggestions.clear();
                self.phase = SearchPhase::Errored;
                SuggestUpdate::Hide
            }
        }
    }
}
