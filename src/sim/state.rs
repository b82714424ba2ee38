//! Round and game state
//!
//! `Round` lives for one guess-and-score cycle; `GameSummary` for one game.
//! Scores are only ever produced by closing a round.

use serde::{Deserialize, Serialize};

use super::score;
use crate::catalog::{Dish, DishId};
use crate::geo::GeoPoint;

/// Where the game is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No game running (before the first start or after quitting)
    Idle,
    /// Selecting content and starting the next round
    TransitioningToNextRound,
    /// Guess timer running, map accepts clicks
    Playing,
    /// Correct location (and guess) on screen for the dwell time
    ResultShowing,
    /// Short countdown before the next round
    ResultCountdown,
    /// Game over, summary is final
    FinalScore,
    /// Catalog had nothing playable
    NoContentAvailable,
}

impl RoundPhase {
    /// Phases in which "skip" short-circuits to the next round
    pub fn is_result(&self) -> bool {
        matches!(self, RoundPhase::ResultShowing | RoundPhase::ResultCountdown)
    }
}

/// The live round
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// 1-based round number within the game
    pub number: u32,
    pub dish: Dish,
    pub image_index: usize,
    pub guess: Option<GeoPoint>,
    pub time_left_secs: u32,
    distance_km: Option<f64>,
    score: u32,
    closed: bool,
}

impl Round {
    pub fn new(number: u32, dish: Dish, image_index: usize, time_left_secs: u32) -> Self {
        Self {
            number,
            dish,
            image_index,
            guess: None,
            time_left_secs,
            distance_km: None,
            score: 0,
            closed: false,
        }
    }

    /// Image on screen this round
    pub fn shown_image(&self) -> &str {
        &self.dish.images[self.image_index]
    }

    pub fn correct_position(&self) -> GeoPoint {
        self.dish.position()
    }

    /// `None` until closed, and after closing iff no guess was placed
    pub fn distance_km(&self) -> Option<f64> {
        self.distance_km
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Score the round. A round without a guess scores exactly 0.
    ///
    /// Closing twice is a no-op that returns the first result.
    pub fn close(&mut self) -> RoundResult {
        if !self.closed {
            self.closed = true;
            match self.guess {
                Some(guess) => {
                    let distance = guess.distance_km(&self.correct_position());
                    self.distance_km = Some(distance);
                    self.score = score::score(distance);
                }
                None => {
                    self.distance_km = None;
                    self.score = 0;
                }
            }
        }
        self.result()
    }

    fn result(&self) -> RoundResult {
        RoundResult {
            number: self.number,
            dish_id: self.dish.id.clone(),
            dish_name: self.dish.name.clone(),
            guess: self.guess,
            correct_position: self.correct_position(),
            distance_km: self.distance_km,
            score: self.score,
        }
    }
}

/// Per-round line of the final score screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub number: u32,
    pub dish_id: DishId,
    pub dish_name: String,
    pub guess: Option<GeoPoint>,
    pub correct_position: GeoPoint,
    pub distance_km: Option<f64>,
    pub score: u32,
}

/// Running totals for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub total_score: u32,
    /// Sum over rounds that had a guess
    pub total_distance_km: f64,
    pub rounds_played: u32,
    pub round_limit: u32,
    pub dish_ids_played: Vec<DishId>,
    pub rounds: Vec<RoundResult>,
    /// Unix timestamp (ms) when the game started
    pub started_at: f64,
    finished: bool,
}

impl GameSummary {
    pub fn new(round_limit: u32, started_at: f64) -> Self {
        Self {
            total_score: 0,
            total_distance_km: 0.0,
            rounds_played: 0,
            round_limit,
            dish_ids_played: Vec::new(),
            rounds: Vec::new(),
            started_at,
            finished: false,
        }
    }

    /// Fold a closed round into the totals. Ignored once the game is final.
    pub fn record_round(&mut self, result: RoundResult) -> bool {
        if self.finished {
            log::warn!("Round {} recorded after game end, ignoring", result.number);
            return false;
        }
        self.total_score += result.score;
        if let Some(d) = result.distance_km {
            self.total_distance_km += d;
        }
        self.rounds_played += 1;
        self.dish_ids_played.push(result.dish_id.clone());
        self.rounds.push(result);
        true
    }

    /// Freeze the summary
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// All rounds of the game have been scored
    pub fn limit_reached(&self) -> bool {
        self.rounds_played >= self.round_limit
    }

    /// The "out of" figure on the final screen
    pub fn max_score(&self) -> u32 {
        score::max_total(self.round_limit)
    }
}

/// Everything the presentation layer needs to hear about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
        dish: Dish,
        image: String,
        time_left: u32,
    },
    Tick {
        time_left: u32,
    },
    GuessRegistered {
        position: GeoPoint,
    },
    RoundScored {
        distance_km: Option<f64>,
        score: u32,
        correct_position: GeoPoint,
    },
    CountdownTick {
        n: u32,
    },
    GameFinished {
        summary: GameSummary,
    },
    Paused,
    Resumed,
    NoContentAvailable,
}
