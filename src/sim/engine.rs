//! Round lifecycle
//!
//! ```text
//! Idle ──start──▶ Transitioning ──▶ Playing ──submit/timeout──▶ ResultShowing
//!                      ▲                                          │ dwell / skip
//!                      └──── countdown / skip ── ResultCountdown ◀┘
//! Transitioning ──round limit──▶ FinalScore ──play again──▶ Transitioning
//! ```
//!
//! All timed phases run on one `TimerController`. The host feeds player
//! input first and then calls [`RoundEngine::update`] with the elapsed time;
//! input therefore wins over a timer firing in the same frame.

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::selector::{ContentSelector, GameSelection};
use super::state::{GameEvent, GameSummary, Round, RoundPhase};
use super::timer::{PausedTimer, TimerController, TimerFired, TimerHandle};
use crate::catalog::ContentCatalog;
use crate::error::GameError;
use crate::geo::GeoPoint;
use crate::persistence::SessionStore;
use crate::platform::now_ms;
use crate::settings::GameConfig;

/// Which phase a countdown belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPurpose {
    Guess,
    Dwell,
    Countdown,
}

/// Drives one player's games
#[derive(Debug)]
pub struct RoundEngine<S> {
    config: GameConfig,
    selector: ContentSelector,
    store: S,
    rng: Pcg32,
    timers: TimerController<TimerPurpose>,
    phase: RoundPhase,
    round: Option<Round>,
    summary: Option<GameSummary>,
    game: GameSelection,
    active_timer: Option<TimerHandle>,
    paused: Option<PausedTimer<TimerPurpose>>,
    events: Vec<GameEvent>,
}

impl<S: SessionStore> RoundEngine<S> {
    /// Snapshot the catalog and wait in `Idle` for [`start_game`](Self::start_game)
    pub fn new<C: ContentCatalog + ?Sized>(
        catalog: &C,
        store: S,
        config: GameConfig,
        seed: u64,
    ) -> Self {
        let config = config.sanitized();
        Self {
            selector: ContentSelector::new(catalog, config.max_recent_repeats),
            config,
            store,
            rng: Pcg32::seed_from_u64(seed),
            timers: TimerController::new(),
            phase: RoundPhase::Idle,
            round: None,
            summary: None,
            game: GameSelection::new(),
            active_timer: None,
            paused: None,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The current (or, after the game ends, the last) round
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    /// Seconds left on the guess timer
    pub fn time_left(&self) -> Option<u32> {
        self.round.as_ref().map(|r| r.time_left_secs)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a new game from `Idle` (or after a content failure).
    ///
    /// Returns `Ok(false)` if a game is already running.
    pub fn start_game(&mut self) -> Result<bool, GameError> {
        match self.phase {
            RoundPhase::Idle | RoundPhase::NoContentAvailable => {
                self.begin_game()?;
                Ok(true)
            }
            phase => {
                log::debug!("start_game ignored in {phase:?}");
                Ok(false)
            }
        }
    }

    /// Start over from the final score screen
    pub fn play_again(&mut self) -> Result<bool, GameError> {
        if self.phase != RoundPhase::FinalScore {
            log::debug!("play_again ignored in {:?}", self.phase);
            return Ok(false);
        }
        self.begin_game()?;
        Ok(true)
    }

    /// Abandon the game and go back to `Idle`
    pub fn quit(&mut self) {
        self.cancel_active_timer();
        self.paused = None;
        self.round = None;
        self.summary = None;
        self.game = GameSelection::new();
        self.phase = RoundPhase::Idle;
        log::info!("Game quit");
    }

    /// Drop or move the marker on the map
    pub fn place_guess(&mut self, position: GeoPoint) -> bool {
        if self.phase != RoundPhase::Playing || self.is_paused() {
            log::debug!("Guess ignored in {:?}", self.phase);
            return false;
        }
        let Some(round) = self.round.as_mut() else {
            return false;
        };
        round.guess = Some(position);
        self.events.push(GameEvent::GuessRegistered { position });
        true
    }

    /// Lock in the current guess, or no guess at all
    pub fn submit_guess(&mut self) -> bool {
        if self.phase != RoundPhase::Playing || self.is_paused() {
            log::debug!("Submit ignored in {:?}", self.phase);
            return false;
        }
        self.close_round();
        true
    }

    /// Cut the result screen or countdown short.
    ///
    /// Only the first skip of a result phase does anything; the round it
    /// starts is `Playing`, where skip is rejected.
    pub fn skip(&mut self) -> bool {
        if !self.phase.is_result() {
            log::debug!("Skip ignored in {:?}", self.phase);
            return false;
        }
        self.cancel_active_timer();
        if self.paused.take().is_some() {
            self.events.push(GameEvent::Resumed);
        }
        self.leave_results();
        true
    }

    /// Freeze whichever countdown is running
    pub fn pause(&mut self) -> bool {
        if self.paused.is_some() {
            return false;
        }
        let Some(handle) = self.active_timer.take() else {
            return false;
        };
        self.paused = self.timers.pause(handle);
        if self.paused.is_none() {
            return false;
        }
        self.events.push(GameEvent::Paused);
        log::info!("Paused in {:?}", self.phase);
        true
    }

    /// Continue the frozen countdown with exactly the time it had left
    pub fn resume(&mut self) -> bool {
        let Some(paused) = self.paused.take() else {
            return false;
        };
        log::info!("Resumed with {}s left", paused.remaining_secs);
        self.active_timer = Some(self.timers.resume(paused));
        self.events.push(GameEvent::Resumed);
        true
    }

    /// Advance time and run every timer firing that became due
    pub fn update(&mut self, dt: Duration) {
        self.timers.advance(dt);
        while let Some(fired) = self.timers.poll() {
            self.on_timer(fired);
        }
    }

    fn begin_game(&mut self) -> Result<(), GameError> {
        self.cancel_active_timer();
        self.paused = None;
        self.round = None;
        self.game = GameSelection::new();
        self.summary = Some(GameSummary::new(self.config.rounds_per_game, now_ms()));
        log::info!(
            "New game: {} rounds from {} dishes",
            self.config.rounds_per_game,
            self.selector.eligible_count()
        );
        self.start_next_round()
    }

    /// Select and begin the next round, or finish the game at the limit.
    ///
    /// Every caller runs to completion before returning, so the guard below
    /// only matters if a host re-enters the engine while a selection is in
    /// flight (e.g. from a storage callback).
    fn start_next_round(&mut self) -> Result<(), GameError> {
        if self.phase == RoundPhase::TransitioningToNextRound {
            log::debug!("Next round already starting");
            return Ok(());
        }
        self.phase = RoundPhase::TransitioningToNextRound;
        self.cancel_active_timer();
        self.paused = None;

        let limit_reached = self.summary.as_ref().is_none_or(GameSummary::limit_reached);
        if limit_reached {
            self.finish_game();
            return Ok(());
        }

        let selector = &self.selector;
        let game = &mut self.game;
        let rng = &mut self.rng;
        let selection = self
            .store
            .update_session(|record| selector.select_next_dish(record, game, rng));

        let selection = match selection {
            Ok(selection) => selection,
            Err(e) => {
                log::warn!("Cannot start round: {e}");
                self.round = None;
                self.phase = RoundPhase::NoContentAvailable;
                self.events.push(GameEvent::NoContentAvailable);
                return Err(e);
            }
        };

        let number = self.summary.as_ref().map_or(1, |s| s.rounds_played + 1);
        let time_left = self.config.round_time_secs;
        let round = Round::new(number, selection.dish, selection.image_index, time_left);
        log::info!(
            "Round {}/{}: {}",
            number,
            self.config.rounds_per_game,
            round.dish.name
        );
        self.events.push(GameEvent::RoundStarted {
            round: number,
            dish: round.dish.clone(),
            image: round.shown_image().to_string(),
            time_left,
        });
        self.round = Some(round);
        self.active_timer = Some(self.timers.schedule(time_left, TimerPurpose::Guess));
        self.phase = RoundPhase::Playing;
        Ok(())
    }

    fn close_round(&mut self) {
        self.cancel_active_timer();
        let Some(round) = self.round.as_mut().filter(|r| !r.is_closed()) else {
            return;
        };
        let result = round.close();
        log::info!(
            "Round {} scored {} ({})",
            result.number,
            result.score,
            result
                .distance_km
                .map_or_else(|| "no guess".to_string(), |d| format!("{d:.0} km"))
        );
        self.events.push(GameEvent::RoundScored {
            distance_km: result.distance_km,
            score: result.score,
            correct_position: result.correct_position,
        });
        if let Some(summary) = self.summary.as_mut() {
            summary.record_round(result);
        }

        self.phase = RoundPhase::ResultShowing;
        self.active_timer = Some(
            self.timers
                .schedule(self.config.result_dwell_secs, TimerPurpose::Dwell),
        );
    }

    /// Skip out of the dwell or countdown. Failure to start the next round
    /// is already reflected in the phase and event stream.
    fn leave_results(&mut self) {
        if self.summary.as_ref().is_none_or(GameSummary::limit_reached) {
            self.finish_game();
            return;
        }
        let _ = self.start_next_round();
    }

    /// Dwell over: final screen after the last round, countdown otherwise
    fn begin_countdown(&mut self) {
        if self.summary.as_ref().is_none_or(GameSummary::limit_reached) {
            self.finish_game();
            return;
        }
        let n = self.config.countdown_secs;
        self.phase = RoundPhase::ResultCountdown;
        self.events.push(GameEvent::CountdownTick { n });
        self.active_timer = Some(self.timers.schedule(n, TimerPurpose::Countdown));
    }

    fn finish_game(&mut self) {
        self.cancel_active_timer();
        self.paused = None;
        let Some(summary) = self.summary.as_mut() else {
            self.phase = RoundPhase::Idle;
            return;
        };
        summary.finish();
        let summary = summary.clone();
        self.phase = RoundPhase::FinalScore;
        self.store.record_game_completion(&summary.dish_ids_played);
        log::info!(
            "Game finished: {}/{} over {} rounds",
            summary.total_score,
            summary.max_score(),
            summary.rounds_played
        );
        self.events.push(GameEvent::GameFinished { summary });
    }

    fn on_timer(&mut self, fired: TimerFired<TimerPurpose>) {
        if self.active_timer != Some(fired.handle()) {
            // Unreachable: every timer the engine drops is cancelled first
            log::error!("Ignoring stale {:?} timer firing", fired.tag());
            return;
        }

        match fired {
            TimerFired::Tick {
                tag: TimerPurpose::Guess,
                remaining,
                ..
            } => {
                if let Some(round) = self.round.as_mut() {
                    round.time_left_secs = remaining;
                }
                self.events.push(GameEvent::Tick {
                    time_left: remaining,
                });
            }
            TimerFired::Complete {
                tag: TimerPurpose::Guess,
                ..
            } => {
                self.active_timer = None;
                log::info!("Time up");
                self.close_round();
            }
            TimerFired::Tick {
                tag: TimerPurpose::Dwell,
                ..
            } => {}
            TimerFired::Complete {
                tag: TimerPurpose::Dwell,
                ..
            } => {
                self.active_timer = None;
                self.begin_countdown();
            }
            TimerFired::Tick {
                tag: TimerPurpose::Countdown,
                remaining,
                ..
            } => {
                self.events.push(GameEvent::CountdownTick { n: remaining });
            }
            TimerFired::Complete {
                tag: TimerPurpose::Countdown,
                ..
            } => {
                self.active_timer = None;
                let _ = self.start_next_round();
            }
        }
    }

    fn cancel_active_timer(&mut self) {
        if let Some(handle) = self.active_timer.take() {
            self.timers.cancel(handle);
        }
    }
}
