use std::time::Duration;

/// Per-process play statistics shown in the HUD
pub struct GameMetrics {
    pub high_score: u32,
    pub games_played: u32,
    pub last_score: Option<u32>,
    pub best_level: u32,
    new_record: bool,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            high_score: 0,
            games_played: 0,
            last_score: None,
            best_level: 1,
            new_record: false,
        }
    }

    pub fn on_game_start(&mut self) {
        self.new_record = false;
    }

    pub fn on_game_over(&mut self, final_score: u32, level: u32) {
        self.games_played += 1;
        self.last_score = Some(final_score);
        self.best_level = self.best_level.max(level);
        self.new_record = final_score > self.high_score;
        if self.new_record {
            self.high_score = final_score;
        }
    }

    /// Whether the last finished game beat the previous high score
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    /// Raise the high score after the stored table finished loading
    pub fn merge_high_score(&mut self, stored: u32) {
        self.high_score = self.high_score.max(stored);
    }

    pub fn format_time(elapsed: Duration) -> String {
        let total_secs = elapsed.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_formatting() {
        assert_eq!(GameMetrics::format_time(Duration::from_secs(125)), "02:05");
        assert_eq!(GameMetrics::format_time(Duration::ZERO), "00:00");
        assert_eq!(GameMetrics::format_time(Duration::from_secs(3661)), "61:01");
        assert_eq!(GameMetrics::format_time(Duration::from_millis(59_999)), "00:59");
    }

    #[test]
    fn test_high_score_tracking() {
        let mut metrics = GameMetrics::new();

        metrics.on_game_over(10, 1);
        assert_eq!(metrics.high_score, 10);
        assert_eq!(metrics.games_played, 1);
        assert!(metrics.is_new_record());

        metrics.on_game_over(5, 1);
        assert_eq!(metrics.high_score, 10); // Should not decrease
        assert_eq!(metrics.games_played, 2);
        assert!(!metrics.is_new_record());

        metrics.on_game_over(15, 3);
        assert_eq!(metrics.high_score, 15); // Should update
        assert_eq!(metrics.games_played, 3);
        assert_eq!(metrics.best_level, 3);
        assert_eq!(metrics.last_score, Some(15));
    }

    #[test]
    fn test_stored_high_score() {
        let mut metrics = GameMetrics::new();
        metrics.merge_high_score(200);
        metrics.on_game_over(150, 2);
        assert_eq!(metrics.high_score, 200);
        assert!(!metrics.is_new_record());

        metrics.merge_high_score(120);
        assert_eq!(metrics.high_score, 200);
        metrics.merge_high_score(260);
        assert_eq!(metrics.high_score, 260);

        metrics.on_game_start();
        assert!(!metrics.is_new_record());
    }
}
