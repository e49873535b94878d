use serde::{Deserialize, Serialize};

use crate::article::Article;

/// Aggregate sentiment label for a ticker's news window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// One row of the record store, keyed by ticker symbol.
///
/// Other tools own the rest of the row (indicators, fundamentals, …); the
/// flattened `extra` map round-trips those fields untouched so a merge can
/// rewrite the whole document without losing them. The three news fields
/// default on deserialization, which also covers records written before
/// the field migration ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerRecord {
    pub ticker: String,
    #[serde(default)]
    pub news_articles: Vec<Article>,
    #[serde(default)]
    pub news_sentiment: Option<Sentiment>,
    #[serde(default)]
    pub last_news_refresh: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
