//! Game configuration
//!
//! Persisted separately from the session record. Every field defaults to
//! the fixed game constants; stored values only tune them.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::StorageError;
use crate::persistence::{read_or_default, storage_key, write_value};
use crate::platform::KeyValueStorage;

/// Timings and limits for one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Rounds before the final score
    pub rounds_per_game: u32,
    /// Guess timer (seconds)
    pub round_time_secs: u32,
    /// Result screen dwell (seconds)
    pub result_dwell_secs: u32,
    /// Pre-round countdown ticks
    pub countdown_secs: u32,
    /// Recently played dishes allowed back into one game (0 disables)
    pub max_recent_repeats: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds_per_game: ROUNDS_PER_GAME,
            round_time_secs: ROUND_TIME_SECS,
            result_dwell_secs: RESULT_DWELL_SECS,
            countdown_secs: COUNTDOWN_SECS,
            max_recent_repeats: MAX_RECENT_REPEATS,
        }
    }
}

impl GameConfig {
    /// Storage name
    const NAME: &'static str = "config";

    /// Clamp values that would make a game unplayable
    pub fn sanitized(self) -> Self {
        let rounds_per_game = self.rounds_per_game.clamp(1, 50);
        Self {
            rounds_per_game,
            round_time_secs: self.round_time_secs.clamp(5, 600),
            result_dwell_secs: self.result_dwell_secs.min(60),
            countdown_secs: self.countdown_secs.min(10),
            max_recent_repeats: self.max_recent_repeats.min(rounds_per_game),
        }
    }

    /// Best possible total for this configuration
    pub fn max_score(&self) -> u32 {
        crate::sim::score::max_total(self.rounds_per_game)
    }

    /// Load the stored configuration, defaults if absent or unreadable
    pub fn load<K: KeyValueStorage + ?Sized>(storage: &K) -> Self {
        let config: Self = read_or_default(storage, &storage_key(Self::NAME));
        log::info!(
            "Config: {} rounds, {}s timer, {}s dwell",
            config.rounds_per_game,
            config.round_time_secs,
            config.result_dwell_secs
        );
        config.sanitized()
    }

    pub fn save<K: KeyValueStorage + ?Sized>(&self, storage: &mut K) -> Result<(), StorageError> {
        write_value(storage, &storage_key(Self::NAME), self)?;
        log::info!("Config saved");
        Ok(())
    }
}
