use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::article::{Article, RawArticle};
use crate::record::{Sentiment, TickerRecord};

/// An article whose `published_at` does not parse is kept rather than
/// dropped. Bad timestamps must never cause data loss.
const KEEP_UNPARSEABLE: bool = true;

/// Freshly fetched articles, keyed by ticker symbol.
pub type NewsBatch = BTreeMap<String, Vec<RawArticle>>;

/// Tunables for one merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Articles older than this many days are dropped.
    pub keep_days: i64,
    /// Hard cap on articles kept per ticker.
    pub max_articles: usize,
    /// Weighted average at or above this labels the window Positive.
    pub positive_threshold: f64,
    /// Weighted average at or below this labels the window Negative.
    pub negative_threshold: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            keep_days: 7,
            max_articles: 25,
            positive_threshold: 0.25,
            negative_threshold: -0.25,
        }
    }
}

/// Outcome of a merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Tickers whose record was updated.
    pub processed: usize,
    /// Batch tickers with no matching record. The store is untouched for
    /// these; they are reported so upstream symbol mismatches stay visible.
    pub skipped: Vec<String>,
}

/// Merges existing and incoming articles by id.
///
/// Keeps every existing article in order, then appends each incoming
/// article whose id has not been seen yet (in the existing list or earlier
/// in the batch). Idempotent: re-running with the same incoming batch
/// against its own output changes nothing.
pub fn dedupe(existing: &[Article], incoming: &[Article]) -> Vec<Article> {
    let mut seen: HashSet<&str> = existing.iter().map(|a| a.id.as_str()).collect();
    let mut merged = existing.to_vec();
    for article in incoming {
        if seen.insert(article.id.as_str()) {
            merged.push(article.clone());
        }
    }
    merged
}

/// Drops articles older than `keep_days`, orders the survivors newest
/// first, and caps the list at `max_articles`.
///
/// Recency compares the parsed `published_at` against `now - keep_days`;
/// both `Z`-suffixed and explicit-offset forms are accepted. Ordering uses
/// the raw timestamp string (missing ones sort as `""`, landing last), so
/// unparseable stamps survive filtering but never displace dated articles.
pub fn trim_recent(
    articles: &[Article],
    now: DateTime<Utc>,
    keep_days: i64,
    max_articles: usize,
) -> Vec<Article> {
    let cutoff = now - Duration::days(keep_days);

    let mut recent: Vec<Article> = articles
        .iter()
        .filter(|a| is_recent(a, cutoff))
        .cloned()
        .collect();
    recent.sort_by(|a, b| sort_key(b).cmp(sort_key(a)));
    recent.truncate(max_articles);
    recent
}

fn is_recent(article: &Article, cutoff: DateTime<Utc>) -> bool {
    let Some(published_at) = article.published_at.as_deref() else {
        return KEEP_UNPARSEABLE;
    };
    match DateTime::parse_from_rfc3339(published_at) {
        Ok(ts) => ts.with_timezone(&Utc) >= cutoff,
        Err(_) => KEEP_UNPARSEABLE,
    }
}

fn sort_key(article: &Article) -> &str {
    article.published_at.as_deref().unwrap_or("")
}

/// Relevance-weighted average sentiment, mapped to a label.
///
/// Weight is the article's relevance score, or 1.0 for articles that
/// predate normalization and carry none. An all-zero weight sum averages
/// to 0.0 instead of dividing by zero. An empty window is Neutral.
pub fn aggregate(articles: &[Article], config: &MergeConfig) -> Sentiment {
    if articles.is_empty() {
        return Sentiment::Neutral;
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for article in articles {
        let score = article.sentiment_score.unwrap_or(0.0);
        let weight = article.relevance_score.unwrap_or(1.0);
        num += score * weight;
        den += weight;
    }
    let avg = if den != 0.0 { num / den } else { 0.0 };

    if avg >= config.positive_threshold {
        Sentiment::Positive
    } else if avg <= config.negative_threshold {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Runs the normalize → dedupe → trim → aggregate pipeline for each ticker
/// in a batch, updating the matching records in place.
pub struct NewsMerger {
    config: MergeConfig,
}

impl NewsMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Applies `batch` to `records`.
    ///
    /// Tickers without a matching record are skipped, never created, and
    /// collected in the report. For every matched ticker the three derived
    /// fields are rewritten and `last_news_refresh` is stamped with `now`,
    /// even when the merged window comes out empty or unchanged. The
    /// caller persists the records afterwards; nothing is written here.
    pub fn merge_batch(
        &self,
        records: &mut [TickerRecord],
        batch: &NewsBatch,
        now: DateTime<Utc>,
    ) -> MergeReport {
        let index: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.ticker.clone(), i))
            .collect();

        let mut report = MergeReport::default();
        for (ticker, raw_articles) in batch {
            let Some(&i) = index.get(ticker) else {
                debug!("no record for ticker {}, skipping", ticker);
                report.skipped.push(ticker.clone());
                continue;
            };
            let record = &mut records[i];

            let incoming: Vec<Article> = raw_articles.iter().map(Article::normalize).collect();
            let merged = trim_recent(
                &dedupe(&record.news_articles, &incoming),
                now,
                self.config.keep_days,
                self.config.max_articles,
            );

            record.news_sentiment = Some(aggregate(&merged, &self.config));
            record.news_articles = merged;
            record.last_news_refresh = Some(iso_utc(now));
            report.processed += 1;
        }
        report
    }
}

/// RFC 3339 UTC with a `Z` suffix, e.g. `2025-08-07T17:00:00.123456Z`.
pub fn iso_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
