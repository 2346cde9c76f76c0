//! Navigable location state: `/?q=<label>&type=<movie|genre>`.
//!
//! The two query parameters are the only persisted state of the client.
//! A location missing either of them (or carrying an unknown `type`) is the
//! home view.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

const PARAM_QUERY: &str = "q";
const PARAM_KIND: &str = "type";

// Only used to give relative locations something to resolve against.
const LOCATION_ORIGIN: &str = "http://cinematch.local/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Movie,
    Genre,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Genre => "genre",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "genre" => Ok(Self::Genre),
            other => anyhow::bail!("unknown query type: {other}"),
        }
    }
}

/// `{q, type}` as carried by a results location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationParams {
    pub query: String,
    pub kind: QueryKind,
}

impl NavigationParams {
    pub fn new(query: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            query: query.into(),
            kind,
        }
    }

    pub fn movie(query: impl Into<String>) -> Self {
        Self::new(query, QueryKind::Movie)
    }

    pub fn genre(query: impl Into<String>) -> Self {
        Self::new(query, QueryKind::Genre)
    }
}

/// A history entry's address, always rooted at `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(String);

impl Location {
    /// The bare path: home view.
    pub fn home() -> Self {
        Self("/".to_string())
    }

    /// Normalise any user-supplied location (`/?q=…`, `?q=…`, full URL).
    /// Unparseable input falls back to home.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::home();
        }
        let Some(url) = resolve(raw) else {
            tracing::warn!("ignoring unparseable location {:?}", raw);
            return Self::home();
        };
        let raw = match url.query().filter(|q| !q.is_empty()) {
            Some(query) => Self(format!("/?{}", query)),
            None => return Self::home(),
        };
        // Canonical key order and encoding, so a deep link compares equal to
        // the location a search for the same params would push.
        match raw.params() {
            Some(params) => Self::from(&params),
            None => raw,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_home(&self) -> bool {
        self.params().is_none()
    }

    /// Decode `{q, type}`. Either key missing, an empty `q`, or an unknown
    /// `type` yields `None`.
    pub fn params(&self) -> Option<NavigationParams> {
        let url = resolve(&self.0)?;
        let mut query = None;
        let mut kind = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PARAM_QUERY if query.is_none() => query = Some(value.into_owned()),
                PARAM_KIND if kind.is_none() => kind = Some(value.into_owned()),
                _ => {}
            }
        }
        let query = query.filter(|q| !q.trim().is_empty())?;
        let kind = kind?.parse::<QueryKind>().ok()?;
        Some(NavigationParams { query, kind })
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::home()
    }
}

impl From<&NavigationParams> for Location {
    fn from(params: &NavigationParams) -> Self {
        let Some(mut url) = resolve("/") else {
            return Self::home();
        };
        url.query_pairs_mut()
            .append_pair(PARAM_QUERY, &params.query)
            .append_pair(PARAM_KIND, params.kind.as_str());
        Self(format!("/?{}", url.query().unwrap_or_default()))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn resolve(raw: &str) -> Option<Url> {
    let origin = Url::parse(LOCATION_ORIGIN).ok()?;
    origin.join(raw).ok()
}
