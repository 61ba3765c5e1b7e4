//! File-backed score store
//!
//! Keeps two JSON documents in a data directory:
//! - `high_scores.json` - the local high score table
//! - `settings.json` - a flat string map of player settings

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{HighScoreEntry, ScoreStore};

const HIGH_SCORES_FILE: &str = "high_scores.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_json<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", path));
            }
        };
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {:?}", path))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {:?}", self.dir))?;

        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {name}"))?;

        // Write then rename so a crash never leaves a truncated file behind
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move {:?} into place", tmp))?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn load_high_scores(&self) -> Result<Vec<HighScoreEntry>> {
        self.read_json(HIGH_SCORES_FILE)
    }

    fn save_high_scores(&self, entries: &[HighScoreEntry]) -> Result<()> {
        self.write_json(HIGH_SCORES_FILE, entries)
    }

    fn load_setting(&self, key: &str) -> Result<Option<String>> {
        let mut settings: BTreeMap<String, String> = self.read_json(SETTINGS_FILE)?;
        Ok(settings.remove(key))
    }

    fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut settings: BTreeMap<String, String> = self.read_json(SETTINGS_FILE)?;
        settings.insert(key.to_string(), value.to_string());
        self.write_json(SETTINGS_FILE, &settings)
    }
}
