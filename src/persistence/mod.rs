//! Local storage for high scores and player settings.
//!
//! The engine never calls into this module. The front end records a finished
//! session's score here from a background task, so a slow or failing store cannot
//! stall the game loop.

pub mod json_store;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::game::GameMode;

pub use json_store::JsonFileStore;

/// Number of entries kept in a high score table
pub const MAX_HIGH_SCORES: usize = 10;

pub const SETTING_INITIALS: &str = "initials";
pub const SETTING_MODE: &str = "mode";

/// Up to three uppercase letters or digits identifying a player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Initials(String);

impl Initials {
    pub const LEN: usize = 3;

    /// Keep the first three alphanumeric characters, uppercased
    pub fn parse(raw: &str) -> Option<Self> {
        let tag: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(Self::LEN)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if tag.is_empty() {
            None
        } else {
            Some(Self(tag))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Initials {
    fn default() -> Self {
        Self("AAA".to_string())
    }
}

impl fmt::Display for Initials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for Initials {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Initials::parse(&value).ok_or_else(|| format!("invalid initials: {value:?}"))
    }
}

impl From<Initials> for String {
    fn from(value: Initials) -> Self {
        value.0
    }
}

/// One row of a high score table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub initials: Initials,
    pub score: u32,
    /// Unix time in milliseconds
    pub date: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GameMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl HighScoreEntry {
    pub fn new(initials: Initials, score: u32, mode: GameMode) -> Self {
        Self {
            initials,
            score,
            date: now_millis(),
            mode: Some(mode),
            country: None,
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Merge `entry` into a table.
///
/// Keeps one row per initials (the higher score wins), sorts descending and keeps
/// the top [`MAX_HIGH_SCORES`]. Returns true when the entry ends up in the table.
pub fn record_high_score(entries: &mut Vec<HighScoreEntry>, entry: HighScoreEntry) -> bool {
    match entries.iter_mut().find(|e| e.initials == entry.initials) {
        Some(existing) if existing.score >= entry.score => return false,
        Some(existing) => *existing = entry.clone(),
        None => entries.push(entry.clone()),
    }

    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(MAX_HIGH_SCORES);
    entries.contains(&entry)
}

/// Storage for high scores and settings
pub trait ScoreStore: Send + Sync {
    fn load_high_scores(&self) -> Result<Vec<HighScoreEntry>>;

    fn save_high_scores(&self, entries: &[HighScoreEntry]) -> Result<()>;

    fn load_setting(&self, key: &str) -> Result<Option<String>>;

    fn save_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Setting value, or `default` when missing or unreadable
    fn setting_or(&self, key: &str, default: &str) -> String {
        match self.load_setting(key) {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(e) => {
                tracing::warn!("failed to read setting {key}: {e:#}");
                default.to_string()
            }
        }
    }
}

/// Load the table, merge the entry, and write it back
pub fn submit_score(store: &dyn ScoreStore, entry: HighScoreEntry) -> Result<Vec<HighScoreEntry>> {
    let mut entries = store.load_high_scores()?;
    if record_high_score(&mut entries, entry) {
        store.save_high_scores(&entries)?;
    }
    Ok(entries)
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    scores: Mutex<Vec<HighScoreEntry>>,
    settings: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn load_high_scores(&self) -> Result<Vec<HighScoreEntry>> {
        let scores = self
            .scores
            .lock()
            .map_err(|_| anyhow!("score table lock poisoned"))?;
        Ok(scores.clone())
    }

    fn save_high_scores(&self, entries: &[HighScoreEntry]) -> Result<()> {
        let mut scores = self
            .scores
            .lock()
            .map_err(|_| anyhow!("score table lock poisoned"))?;
        *scores = entries.to_vec();
        Ok(())
    }

    fn load_setting(&self, key: &str) -> Result<Option<String>> {
        let settings = self
            .settings
            .lock()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        Ok(settings.get(key).cloned())
    }

    fn save_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self
            .settings
            .lock()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(initials: &str, score: u32) -> HighScoreEntry {
        HighScoreEntry {
            initials: Initials::parse(initials).unwrap(),
            score,
            date: 0,
            mode: None,
            country: None,
        }
    }

    #[test]
    fn test_initials_parsing() {
        assert_eq!(Initials::parse("abcd").unwrap().as_str(), "ABC");
        assert_eq!(Initials::parse(" j-k ").unwrap().as_str(), "JK");
        assert!(Initials::parse("  ").is_none());
        assert_eq!(Initials::default().as_str(), "AAA");
    }

    #[test]
    fn test_record_keeps_higher_per_initials() {
        let mut table = vec![entry("AAA", 100)];

        assert!(!record_high_score(&mut table, entry("AAA", 50)));
        assert_eq!(table, vec![entry("AAA", 100)]);

        assert!(record_high_score(&mut table, entry("AAA", 150)));
        assert_eq!(table, vec![entry("AAA", 150)]);
    }

    #[test]
    fn test_record_sorts_and_caps() {
        let mut table = Vec::new();
        for (i, score) in [30, 90, 10, 70, 50, 20, 80, 40, 60, 100, 5].iter().enumerate() {
            let initials = format!("P{i}");
            record_high_score(&mut table, entry(&initials, *score));
        }

        assert_eq!(table.len(), MAX_HIGH_SCORES);
        assert!(table.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(table[0].score, 100);
        assert!(!table.iter().any(|e| e.score == 5));

        // Too low to make the cut
        assert!(!record_high_score(&mut table, entry("LOW", 1)));
        assert_eq!(table.len(), MAX_HIGH_SCORES);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let table = submit_score(&store, entry("ZED", 40)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(store.load_high_scores().unwrap(), table);

        assert_eq!(store.setting_or(SETTING_INITIALS, "AAA"), "AAA");
        store.save_setting(SETTING_INITIALS, "ZED").unwrap();
        assert_eq!(store.setting_or(SETTING_INITIALS, "AAA"), "ZED");
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_string(&entry("abc", 12)).unwrap();
        assert_eq!(json, r#"{"initials":"ABC","score":12,"date":0}"#);

        let parsed: HighScoreEntry =
            serde_json::from_str(r#"{"initials":"xy","score":3,"date":1,"mode":"battle"}"#)
                .unwrap();
        assert_eq!(parsed.initials.as_str(), "XY");
        assert_eq!(parsed.mode, Some(GameMode::Battle));

        assert!(serde_json::from_str::<HighScoreEntry>(r#"{"initials":"","score":3,"date":1}"#)
            .is_err());
    }
}
