//! Payload types exchanged with the recommendation service.
//!
//! Items are immutable once received: the client replaces whole collections,
//! it never edits an item in place.

use serde::{Deserialize, Serialize};

/// A scored movie entry from `/top-rated`, `/latest`, `/genre` and `/recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: String,
    /// The service sends years as JSON numbers that may carry a fraction.
    #[serde(default)]
    pub release_year: Option<f64>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// A lightweight row in the live-typing dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_year: Option<f64>,
}

impl RecommendationItem {
    pub fn year(&self) -> Option<i32> {
        floor_year(self.release_year)
    }
}

impl SuggestionItem {
    pub fn year(&self) -> Option<i32> {
        floor_year(self.release_year)
    }
}

fn floor_year(year: Option<f64>) -> Option<i32> {
    year.filter(|y| y.is_finite() && *y > 0.0)
        .map(|y| y.floor() as i32)
}

/// `/recommend` wraps its list in an object. A body without the field is a
/// successful response with nothing to show.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub recommendations: Option<Vec<RecommendationItem>>,
}

impl RecommendResponse {
    pub fn into_items(self) -> Vec<RecommendationItem> {
        self.recommendations.unwrap_or_default()
    }
}

/// `/search` answers either with a bare array or with `{ "results": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Bare(Vec<SuggestionItem>),
    Wrapped { results: Vec<SuggestionItem> },
}

impl SearchResponse {
    pub fn into_items(self) -> Vec<SuggestionItem> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped { results } => results,
        }
    }
}

// ── Display helpers ───────────────────────────────────────────────────────────

/// Image sizes used by the different surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterSize {
    /// Dropdown thumbnails.
    Thumb,
    /// Grid cards.
    Card,
    /// Hero banner backgrounds.
    Hero,
}

impl PosterSize {
    pub fn segment(self) -> &'static str {
        match self {
            Self::Thumb => "w92",
            Self::Card => "w342",
            Self::Hero => "original",
        }
    }
}

/// Resolve a poster path to a fetchable URL. Paths that are already absolute
/// are passed through untouched.
pub fn poster_url(path: Option<&str>, size: PosterSize, image_base: &str) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with("http") {
        return Some(path.to_string());
    }
    let base = image_base.trim_end_matches('/');
    let sep = if path.starts_with('/') { "" } else { "/" };
    Some(format!("{}/{}{}{}", base, size.segment(), sep, path))
}

const CONNECTORS: &[&str] = &["of", "and", "in", "on", "to"];
const ROMAN_NUMERALS: &[&str] = &["i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x"];

/// Title-case a movie title for display: Roman numerals upper-cased, the
/// first word capitalised, short connectors kept lower-case.
pub fn display_title(raw: &str) -> String {
    raw.split(' ')
        .enumerate()
        .map(|(idx, word)| {
            let lower = word.to_lowercase();
            if ROMAN_NUMERALS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else if idx > 0 && CONNECTORS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_accepts_both_shapes() {
        let bare: SearchResponse =
            serde_json::from_str(r#"[{"title":"batman","release_year":1989.0}]"#).unwrap();
        let wrapped: SearchResponse =
            serde_json::from_str(r#"{"results":[{"title":"batman","poster_path":"/b.jpg"}]}"#)
                .unwrap();
        assert_eq!(bare.into_items()[0].year(), Some(1989));
        assert_eq!(
            wrapped.into_items()[0].poster_path.as_deref(),
            Some("/b.jpg")
        );
    }

    #[test]
    fn search_response_rejects_other_objects() {
        assert!(serde_json::from_str::<SearchResponse>(r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn recommend_response_without_field_is_empty() {
        let resp: RecommendResponse = serde_json::from_str(r#"{"error":"unknown"}"#).unwrap();
        assert!(resp.into_items().is_empty());
    }

    #[test]
    fn poster_url_prefixes_relative_paths_only() {
        let base = "https://image.tmdb.org/t/p";
        assert_eq!(
            poster_url(Some("/abc.jpg"), PosterSize::Card, base).as_deref(),
            Some("https://image.tmdb.org/t/p/w342/abc.jpg")
        );
        assert_eq!(
            poster_url(Some("https://cdn.example/x.jpg"), PosterSize::Hero, base).as_deref(),
            Some("https://cdn.example/x.jpg")
        );
        assert_eq!(poster_url(Some(""), PosterSize::Thumb, base), None);
        assert_eq!(poster_url(None, PosterSize::Thumb, base), None);
    }

    #[test]
    fn display_title_handles_connectors_and_numerals() {
        assert_eq!(display_title("the lord of the rings"), "The Lord of The Rings");
        assert_eq!(display_title("rocky ii"), "Rocky II");
        assert_eq!(display_title("in the mood for love"), "In The Mood For Love");
    }

    #[test]
    fn year_ignores_missing_and_nonsense() {
        let item = SuggestionItem {
            title: "x".into(),
            poster_path: None,
            release_year: Some(f64::NAN),
        };
        assert_eq!(item.year(), None);
    }
}
