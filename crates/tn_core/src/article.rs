use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Number of hex characters kept from the SHA-256 fingerprint. Ids persist
/// in the store across runs, so this length and the hash input order are
/// part of the store format.
const FINGERPRINT_LEN: usize = 16;

/// An article as delivered by the upstream news fetcher. Everything is
/// optional; missing fields are filled in by [`Article::normalize`].
///
/// Scores must be numeric if present. A non-numeric score is a caller bug
/// and fails batch deserialization instead of being silently defaulted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tickers: Option<Vec<String>>,
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub impact_score: Option<f64>,
}

/// Canonical article shape stored inside a ticker record.
///
/// `published_at` stays as the verbatim ISO-8601 text; parsing happens in
/// the recency filter so a bad timestamp never drops an article on load.
/// Scores are `None` only on articles that predate normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<f64>,
}

impl Article {
    /// Coerces a raw payload into the canonical shape.
    ///
    /// Trims `title` and `url`, defaults missing strings to `""` and
    /// missing scores to `0.0`, and derives a stable id when the caller
    /// did not supply one. Total: never fails.
    pub fn normalize(raw: &RawArticle) -> Self {
        let title = raw.title.as_deref().unwrap_or("").trim().to_string();
        let url = raw.url.as_deref().unwrap_or("").trim().to_string();
        let published_at = raw.published_at.clone();

        let id = match raw.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => article_id_from(&title, &url, published_at.as_deref().unwrap_or("")),
        };

        Self {
            id,
            title,
            source: raw.source.clone().unwrap_or_default(),
            url,
            published_at,
            summary: raw.summary.clone().unwrap_or_default(),
            tickers: raw.tickers.clone().unwrap_or_default(),
            topics: raw.topics.clone().unwrap_or_default(),
            sentiment_score: Some(raw.sentiment_score.unwrap_or(0.0)),
            relevance_score: Some(raw.relevance_score.unwrap_or(0.0)),
            impact_score: Some(raw.impact_score.unwrap_or(0.0)),
        }
    }
}

/// Deterministic article fingerprint: SHA-256 over the UTF-8 bytes of
/// title, url and published time (in that order), truncated to 16 lowercase
/// hex characters. Identical inputs always yield identical ids.
pub fn article_id_from(title: &str, url: &str, published_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(url.as_bytes());
    hasher.update(published_at.as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(FINGERPRINT_LEN);
    for byte in &digest[..FINGERPRINT_LEN / 2] {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_defaults() {
        let article = Article::normalize(&RawArticle::default());
        assert_eq!(article.title, "");
        assert_eq!(article.source, "");
        assert_eq!(article.url, "");
        assert_eq!(article.summary, "");
        assert!(article.published_at.is_none());
        assert!(article.tickers.is_empty());
        assert!(article.topics.is_empty());
        assert_eq!(article.sentiment_score, Some(0.0));
        assert_eq!(article.relevance_score, Some(0.0));
        assert_eq!(article.impact_score, Some(0.0));
        assert_eq!(article.id.len(), 16);
    }

    #[test]
    fn normalize_trims_title_and_url() {
        let raw = RawArticle {
            title: Some("  Apple beats estimates  ".to_string()),
            url: Some(" https://example.com/a \n".to_string()),
            ..Default::default()
        };
        let article = Article::normalize(&raw);
        assert_eq!(article.title, "Apple beats estimates");
        assert_eq!(article.url, "https://example.com/a");
    }

    #[test]
    fn caller_id_wins_when_non_empty() {
        let raw = RawArticle {
            id: Some("upstream-42".to_string()),
            title: Some("t".to_string()),
            ..Default::default()
        };
        assert_eq!(Article::normalize(&raw).id, "upstream-42");
    }

    #[test]
    fn empty_caller_id_falls_back_to_fingerprint() {
        let raw = RawArticle {
            id: Some(String::new()),
            title: Some("t".to_string()),
            url: Some("u".to_string()),
            published_at: Some("2025-08-07T17:00:00Z".to_string()),
            ..Default::default()
        };
        let expected = article_id_from("t", "u", "2025-08-07T17:00:00Z");
        assert_eq!(Article::normalize(&raw).id, expected);
    }

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        let a = article_id_from("title", "url", "2025-01-01T00:00:00Z");
        let b = article_id_from("title", "url", "2025-01-01T00:00:00Z");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));

        assert_ne!(a, article_id_from("title2", "url", "2025-01-01T00:00:00Z"));
        assert_ne!(a, article_id_from("title", "url2", "2025-01-01T00:00:00Z"));
        assert_ne!(a, article_id_from("title", "url", ""));
    }

    #[test]
    fn same_content_yields_same_id_across_normalizations() {
        let raw = RawArticle {
            title: Some("Analyst raises price target".to_string()),
            url: Some("https://example.com/x".to_string()),
            published_at: Some("2025-08-07T13:25:00Z".to_string()),
            ..Default::default()
        };
        assert_eq!(Article::normalize(&raw).id, Article::normalize(&raw).id);
    }
}
