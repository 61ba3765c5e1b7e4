//! World leaderboard client
//!
//! Only an offline implementation exists: it keeps a demo table in memory and
//! applies the same ranking rules as the local high score table. Gameplay never
//! waits on it; the front end calls it from spawned tasks.

use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::persistence::{HighScoreEntry, Initials, record_high_score};

/// Country code used when the player's country is unknown
pub const UNKNOWN_COUNTRY: &str = "XX";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub success: bool,
    pub message: String,
}

pub trait Leaderboard: Send + Sync {
    fn fetch_world_scores(&self) -> impl Future<Output = Result<Vec<HighScoreEntry>>> + Send;

    fn submit_world_score(&self, entry: HighScoreEntry)
        -> impl Future<Output = Result<SubmitReceipt>> + Send;
}

/// In-memory leaderboard seeded with demo entries
#[derive(Debug, Clone)]
pub struct OfflineLeaderboard {
    table: Arc<Mutex<Vec<HighScoreEntry>>>,
    country: String,
}

impl OfflineLeaderboard {
    pub fn new(country: Option<String>) -> Self {
        let country = country
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

        Self {
            table: Arc::new(Mutex::new(demo_scores())),
            country,
        }
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    fn snapshot(&self) -> Result<Vec<HighScoreEntry>> {
        let table = self
            .table
            .lock()
            .map_err(|_| anyhow!("leaderboard lock poisoned"))?;
        Ok(table.clone())
    }

    fn record(&self, mut entry: HighScoreEntry) -> Result<bool> {
        entry.country = Some(self.country.clone());
        let mut table = self
            .table
            .lock()
            .map_err(|_| anyhow!("leaderboard lock poisoned"))?;
        Ok(record_high_score(&mut table, entry))
    }
}

impl Default for OfflineLeaderboard {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Leaderboard for OfflineLeaderboard {
    fn fetch_world_scores(&self) -> impl Future<Output = Result<Vec<HighScoreEntry>>> + Send {
        let scores = self.snapshot();
        async move {
            tracing::debug!("offline leaderboard: serving local world scores");
            scores
        }
    }

    fn submit_world_score(
        &self,
        entry: HighScoreEntry,
    ) -> impl Future<Output = Result<SubmitReceipt>> + Send {
        let board = self.clone();
        async move {
            let initials = entry.initials.clone();
            let ranked = board.record(entry)?;
            tracing::info!(%initials, ranked, "offline leaderboard: score stored locally");
            Ok(SubmitReceipt {
                success: true,
                message: if ranked {
                    "Score saved".to_string()
                } else {
                    "Score saved, not in the top 10".to_string()
                },
            })
        }
    }
}

fn demo_scores() -> Vec<HighScoreEntry> {
    // 2023-05-15 .. 2023-05-19, midnight UTC
    const DAY_MS: u64 = 86_400_000;
    const FIRST_DAY_MS: u64 = 1_684_108_800_000;

    [
        ("AAA", 250, "US"),
        ("BBB", 220, "ES"),
        ("CCC", 190, "JP"),
        ("DDD", 180, "BR"),
        ("EEE", 170, "DE"),
    ]
    .into_iter()
    .enumerate()
    .filter_map(|(i, (initials, score, country))| {
        Some(HighScoreEntry {
            initials: Initials::parse(initials)?,
            score,
            date: FIRST_DAY_MS + i as u64 * DAY_MS,
            mode: None,
            country: Some(country.to_string()),
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameMode;

    fn entry(initials: &str, score: u32) -> HighScoreEntry {
        HighScoreEntry::new(Initials::parse(initials).unwrap(), score, GameMode::Classic)
    }

    #[tokio::test]
    async fn test_seeded_with_demo_table() {
        let board = OfflineLeaderboard::default();
        let scores = board.fetch_world_scores().await.unwrap();

        assert_eq!(scores.len(), 5);
        assert_eq!(scores[0].initials.as_str(), "AAA");
        assert_eq!(scores[0].score, 250);
        assert_eq!(scores[4].country.as_deref(), Some("DE"));
    }

    #[tokio::test]
    async fn test_submit_tags_country_and_ranks() {
        let board = OfflineLeaderboard::new(Some("fr".to_string()));
        let receipt = board.submit_world_score(entry("ZZZ", 300)).await.unwrap();
        assert!(receipt.success);

        let scores = board.fetch_world_scores().await.unwrap();
        assert_eq!(scores[0].initials.as_str(), "ZZZ");
        assert_eq!(scores[0].country.as_deref(), Some("FR"));
    }

    #[tokio::test]
    async fn test_lower_score_keeps_existing_entry() {
        let board = OfflineLeaderboard::default();
        let receipt = board.submit_world_score(entry("AAA", 10)).await.unwrap();
        assert!(receipt.success);

        let scores = board.fetch_world_scores().await.unwrap();
        let aaa: Vec<_> = scores.iter().filter(|e| e.initials.as_str() == "AAA").collect();
        assert_eq!(aaa.len(), 1);
        assert_eq!(aaa[0].score, 250);
    }

    #[test]
    fn test_unknown_country_falls_back() {
        assert_eq!(OfflineLeaderboard::new(None).country(), UNKNOWN_COUNTRY);
        assert_eq!(OfflineLeaderboard::new(Some("???".into())).country(), UNKNOWN_COUNTRY);
        assert_eq!(OfflineLeaderboard::new(Some(" jp ".into())).country(), "JP");
    }
}
