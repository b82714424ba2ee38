//! Game core
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Time only advances when the host says so
//! - Seeded RNG only
//! - Session state comes in through the `SessionStore` trait

pub mod engine;
pub mod score;
pub mod selector;
pub mod state;
pub mod timer;

pub use engine::RoundEngine;
pub use score::score;
pub use selector::{ContentSelector, GameSelection, Selection, least_used_image};
pub use state::{GameEvent, GameSummary, Round, RoundPhase, RoundResult};
pub use timer::{PausedTimer, TimerController, TimerFired, TimerHandle};
