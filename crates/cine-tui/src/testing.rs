//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cine_proto::model::{RecommendResponse, RecommendationItem, SuggestionItem};

use crate::controller::{Controller, ControllerEvent};
use crate::gateway::{FetchError, ListEndpoint, MovieApi};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    List(ListEndpoint),
    Recommend(String),
    Suggest(String),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    lists: HashMap<ListEndpoint, Vec<RecommendationItem>>,
    recommendations: HashMap<String, Vec<RecommendationItem>>,
    suggestions: HashMap<String, Vec<SuggestionItem>>,
    delays: HashMap<Call, Duration>,
    failures: HashSet<Call>,
}

/// In-memory `MovieApi` that records every call. Unknown keys answer with
/// an empty list.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_list(&self, endpoint: ListEndpoint, items: Vec<RecommendationItem>) {
        self.state.lock().unwrap().lists.insert(endpoint, items);
    }

    pub fn set_recommendations(&self, title: &str, items: Vec<RecommendationItem>) {
        self.state
            .lock()
            .unwrap()
            .recommendations
            .insert(title.to_string(), items);
    }

    pub fn set_suggestions(&self, query: &str, items: Vec<SuggestionItem>) {
        self.state
            .lock()
            .unwrap()
            .suggestions
            .insert(query.to_string(), items);
    }

    pub fn delay(&self, call: Call, by: Duration) {
        self.state.lock().unwrap().delays.insert(call, by);
    }

    pub fn fail(&self, call: Call) {
        self.state.lock().unwrap().failures.insert(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    async fn answer<T>(
        &self,
        call: Call,
        cancel: &CancellationToken,
        lookup: impl FnOnce(&FakeState) -> T,
    ) -> Result<T, FetchError> {
        let (delay, failed) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call.clone());
            (
                state.delays.get(&call).copied(),
                state.failures.contains(&call),
            )
        };

        if let Some(delay) = delay {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if failed {
            return Err(FetchError::Status {
                endpoint: "fake",
                status: 500,
            });
        }
        let state = self.state.lock().unwrap();
        Ok(lookup(&state))
    }
}

#[async_trait]
impl MovieApi for FakeApi {
    async fn fetch_list(
        &self,
        endpoint: ListEndpoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecommendationItem>, FetchError> {
        let key = endpoint.clone();
        self.answer(Call::List(endpoint), cancel, |s| {
            s.lists.get(&key).cloned().unwrap_or_default()
        })
        .await
    }

    async fn fetch_recommendations(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse, FetchError> {
        self.answer(Call::Recommend(title.to_string()), cancel, |s| {
            RecommendResponse {
                recommendations: s.recommendations.get(title).cloned(),
            }
        })
        .await
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionItem>, FetchError> {
        self.answer(Call::Suggest(query.to_string()), cancel, |s| {
            s.suggestions.get(query).cloned().unwrap_or_default()
        })
        .await
    }
}

pub fn movie(title: &str) -> RecommendationItem {
    RecommendationItem {
        title: title.to_string(),
        release_year: Some(2021.0),
        vote_average: 7.5,
        popularity: 50.0,
        poster_path: Some(format!("/{}.jpg", title.to_lowercase().replace(' ', "_"))),
    }
}

pub fn movies(titles: &[&str]) -> Vec<RecommendationItem> {
    titles.iter().map(|t| movie(t)).collect()
}

pub fn suggestion(title: &str) -> SuggestionItem {
    SuggestionItem {
        title: title.to_string(),
        poster_path: None,
        release_year: Some(2010.0),
    }
}

/// Feed events to `handle` until `span` of (paused) time has passed or
/// every sender is gone.
pub async fn drive<F>(rx: &mut mpsc::Receiver<ControllerEvent>, span: Duration, mut handle: F)
where
    F: FnMut(ControllerEvent),
{
    let deadline = tokio::time::Instant::now() + span;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => handle(event),
            Ok(None) | Err(_) => break,
        }
    }
}

/// Run the controller's event handling for `span`.
pub async fn settle(
    controller: &mut Controller,
    rx: &mut mpsc::Receiver<ControllerEvent>,
    span: Duration,
) {
    drive(rx, span, |event| controller.handle_event(event)).await;
}
