//! Dish Guessr - guess where a dish comes from
//!
//! Core modules:
//! - `sim`: Round lifecycle, scoring, timers and content rotation
//! - `catalog`: Read-only dish catalog supplied by the host
//! - `persistence`: Versioned session record with lenient decoding
//! - `platform`: Browser/native storage and clock abstraction
//! - `settings`: Tunable game configuration

pub mod catalog;
pub mod error;
pub mod geo;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use catalog::{ContentCatalog, Dish, DishId, StaticCatalog};
pub use error::{CatalogError, GameError, StorageError};
pub use geo::GeoPoint;
pub use highscores::HighScores;
pub use persistence::{MemorySessionStore, PersistentSessionStore, SessionRecord, SessionStore};
pub use settings::GameConfig;

/// Game configuration constants
pub mod consts {
    /// Rounds in one game
    pub const ROUNDS_PER_GAME: u32 = 6;
    /// Guess timer per round (seconds)
    pub const ROUND_TIME_SECS: u32 = 60;
    /// How long the result map stays up before the countdown (seconds)
    pub const RESULT_DWELL_SECS: u32 = 5;
    /// Pre-round countdown ticks (3 -> 2 -> 1 -> 0)
    pub const COUNTDOWN_SECS: u32 = 3;

    /// Points for an exact guess
    pub const MAX_ROUND_SCORE: u32 = 5000;
    /// Floor for any placed guess, however far away
    pub const MIN_PLACED_SCORE: u32 = 50;
    /// Distance (km) over which the score decays by a factor of e
    pub const SCORE_DECAY_KM: f64 = 1000.0;

    /// Mean Earth radius used for great-circle distances (km)
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Dish ids remembered from recent games (~3 games of 6 rounds)
    pub const RECENT_HISTORY_CAP: usize = 18;
    /// Recently played dishes that may be folded back into one game
    pub const MAX_RECENT_REPEATS: u32 = 2;
}
