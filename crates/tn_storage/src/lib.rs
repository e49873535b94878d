use std::fs;
use std::path::{Path, PathBuf};

use tn_core::{Error, Result, TickerRecord};

pub mod migrate;

pub use migrate::MigrationReport;

/// The shared record store: one JSON document holding the full sequence of
/// ticker records, read and rewritten wholesale.
///
/// The path is always supplied by the caller; there is no default
/// location. Concurrent writers are not coordinated here — the last
/// writer wins, so invocations against the same document must be
/// serialized externally.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and deserializes the whole document.
    ///
    /// A missing file is [`Error::StoreNotFound`], raised before anything
    /// has been mutated so the caller can abort the run outright.
    pub fn load(&self) -> Result<Vec<TickerRecord>> {
        let raw = self.read_raw()?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Serializes all records and replaces the document in a single write.
    pub fn save(&self, records: &[TickerRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub(crate) fn read_raw(&self) -> Result<String> {
        if !self.path.exists() {
            return Err(Error::StoreNotFound(self.path.clone()));
        }
        Ok(fs::read_to_string(&self.path)?)
    }

    pub(crate) fn write_raw(&self, contents: &str) -> Result<()> {
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
