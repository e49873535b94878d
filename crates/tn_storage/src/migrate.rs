use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::info;

use crate::JsonStore;
use tn_core::merge::iso_utc;
use tn_core::Result;

/// Fields the merge pipeline expects on every record, with their defaults.
const NEWS_FIELDS: [(&str, Value); 3] = [
    ("news_articles", Value::Array(vec![])),
    ("news_sentiment", Value::Null),
    ("last_news_refresh", Value::Null),
];

/// Outcome of a field migration run.
#[derive(Debug, Clone, Copy)]
pub struct MigrationReport {
    /// Individual fields inserted across all records.
    pub fields_added: usize,
    /// Total records in the store.
    pub records: usize,
}

/// One-time backfill of the news fields on a store that predates them.
///
/// Works on the raw JSON rows rather than the typed model, since the whole
/// point is that these documents were written before the model existed. A
/// verbatim copy of the original text goes to `<store>.pre_news_backup.json`
/// before anything is mutated. Records whose `last_news_refresh` is null or
/// empty get stamped with the migration time, so every record leaves with a
/// concrete refresh timestamp. Safe to re-run: a fully migrated store
/// reports zero added fields.
pub fn add_news_fields(store: &JsonStore, now: DateTime<Utc>) -> Result<MigrationReport> {
    let raw = store.read_raw()?;
    let mut rows: Vec<Map<String, Value>> = serde_json::from_str(&raw)?;

    let backup_path = store.path().with_extension("pre_news_backup.json");
    std::fs::write(&backup_path, &raw)?;
    info!("backup saved to {}", backup_path.display());

    let mut fields_added = 0;
    for row in &mut rows {
        for (field, default) in &NEWS_FIELDS {
            if !row.contains_key(*field) {
                row.insert((*field).to_string(), default.clone());
                fields_added += 1;
            }
        }
    }

    let stamp = Value::String(iso_utc(now));
    for row in &mut rows {
        if refresh_is_empty(&row["last_news_refresh"]) {
            row.insert("last_news_refresh".to_string(), stamp.clone());
        }
    }

    store.write_raw(&serde_json::to_string_pretty(&rows)?)?;
    Ok(MigrationReport {
        fields_added,
        records: rows.len(),
    })
}

fn refresh_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
