//! Fetch gateway: the only place that talks to the recommendation service.
//!
//! Every call takes a cancellation token. A call whose token fires before the
//! response resolves returns `FetchError::Cancelled`, which callers treat as
//! "superseded" rather than as a failure.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cine_proto::config::ApiConfig;
use cine_proto::model::{RecommendResponse, RecommendationItem, SearchResponse, SuggestionItem};

/// The genre tab that is really the top-rated list.
pub const TOP_RATED_TAB: &str = "Top Rated";

/// Tabs shown in the genre bar, in display order.
pub const GENRE_TABS: &[&str] = &[
    TOP_RATED_TAB,
    "Action",
    "Romance",
    "Animation",
    "Horror",
    "Crime",
    "Drama",
];

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("malformed response from {endpoint}: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("request superseded")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Endpoints that answer with a bare list of recommendation items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListEndpoint {
    TopRated,
    Latest,
    Genre(String),
}

impl ListEndpoint {
    /// Route a genre tab. "Top Rated" is presented as a genre but is served
    /// by its own endpoint.
    pub fn for_tab(name: &str) -> Self {
        if name == TOP_RATED_TAB {
            Self::TopRated
        } else {
            Self::Genre(name.to_string())
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::TopRated => "/top-rated",
            Self::Latest => "/latest",
            Self::Genre(_) => "/genre",
        }
    }

    fn param(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::Genre(genre) => Some(("genre", genre.as_str())),
            _ => None,
        }
    }
}

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn fetch_list(
        &self,
        endpoint: ListEndpoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecommendationItem>, FetchError>;

    async fn fetch_recommendations(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse, FetchError>;

    async fn fetch_suggestions(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionItem>, FetchError>;
}

pub type SharedApi = Arc<dyn MovieApi>;

/// reqwest-backed gateway. The base URL is injected at construction and
/// never read from the environment afterwards.
pub struct HttpGateway {
    client: reqwest::Client,
    base: Url,
}

impl HttpGateway {
    pub fn new(api: &ApiConfig) -> anyhow::Result<Self> {
        let base = Url::parse(api.base_url.trim())?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry paths: {}", api.base_url);
        }
        let client = reqwest::Client::builder().timeout(api.timeout()).build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint_url(&self, path: &str, param: Option<(&str, &str)>) -> Url {
        let mut url = self.base.clone();
        let prefix = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", prefix, path));
        url.set_query(None);
        if let Some((key, value)) = param {
            url.query_pairs_mut().append_pair(key, value);
        }
        url
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &'static str,
        param: Option<(&str, &str)>,
        cancel: &CancellationToken,
    ) -> Result<T, FetchError> {
        let url = self.endpoint_url(endpoint, param);
        debug!("GET {}", url);

        let request = async {
            let response = self
                .client
                .get(url)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|source| FetchError::Transport { endpoint, source })?;

            if !response.status().is_success() {
                return Err(FetchError::Status {
                    endpoint,
                    status: response.status().as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|source| FetchError::Transport { endpoint, source })?;
            serde_json::from_slice(&body).map_err(|source| FetchError::Parse { endpoint, source })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = request => result,
        }
    }
}

#[async_trait]
impl MovieApi for HttpGateway {
    async fn fetch_list(
        &self,
        endpoint: ListEndpoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<RecommendationItem>, FetchError> {
        self.get_json(endpoint.path(), endpoint.param(), cancel).await
    }

    async fn fetch_recommendations(
        &self,
        title: &str,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse, FetchError> {
        self.get_json("/recommend", Some(("movie", title)), cancel)
            .await
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SuggestionItem>, FetchError> {
        let response: SearchResponse = self
            .get_json("/search", Some(("query", query.trim())), cancel)
            .await?;
        Ok(response.into_items())
    }
}
