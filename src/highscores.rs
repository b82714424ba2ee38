//! Best-games leaderboard
//!
//! Persisted next to the session record, keeps the top 10 finished games.

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::persistence::{read_or_default, storage_key, write_value};
use crate::platform::KeyValueStorage;
use crate::sim::GameSummary;

/// Maximum number of games to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    /// Best possible score for that game
    pub max_score: u32,
    pub rounds: u32,
    pub total_distance_km: f64,
    /// Unix timestamp (ms) when the game started
    pub timestamp: f64,
}

impl HighScoreEntry {
    pub fn from_summary(summary: &GameSummary) -> Self {
        Self {
            score: summary.total_score,
            max_score: summary.max_score(),
            rounds: summary.rounds_played,
            total_distance_km: summary.total_distance_km,
            timestamp: summary.started_at,
        }
    }
}

/// Leaderboard, best first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage name
    const NAME: &'static str = "highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score earns a place
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would get (1-indexed), None if it doesn't qualify
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished game. Returns the rank achieved, if any.
    pub fn add(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Ties keep the earlier game ahead
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn add_summary(&mut self, summary: &GameSummary) -> Option<usize> {
        self.add(HighScoreEntry::from_summary(summary))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load<K: KeyValueStorage + ?Sized>(storage: &K) -> Self {
        let mut scores: Self = read_or_default(storage, &storage_key(Self::NAME));
        scores.entries.truncate(MAX_HIGH_SCORES);
        log::info!("Loaded {} high scores", scores.entries.len());
        scores
    }

    pub fn save<K: KeyValueStorage + ?Sized>(&self, storage: &mut K) -> Result<(), StorageError> {
        write_value(storage, &storage_key(Self::NAME), self)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Format a timestamp relative to `now` (both Unix ms)
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_mins = ((now - timestamp) / 60_000.0).max(0.0);
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as u64;
        match days {
            1 => "Yesterday".to_string(),
            2..=6 => format!("{days} days ago"),
            7..=13 => "1 week ago".to_string(),
            _ => format!("{} weeks ago", days / 7),
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as u64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{hours} hours ago")
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as u64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{mins} mins ago")
        }
    } else {
        "Just now".to_string()
    }
}
