//! Browser platform: LocalStorage backend and page bindings
//!
//! The page script owns rendering, audio and the map widget. It forwards
//! clicks and frame times to [`WebGame`] and renders the JSON events it
//! gets back.

use std::time::Duration;

use wasm_bindgen::prelude::*;

use super::{KeyValueStorage, MemoryStorage, now_ms};
use crate::catalog::StaticCatalog;
use crate::error::StorageError;
use crate::geo::GeoPoint;
use crate::highscores::HighScores;
use crate::persistence::PersistentSessionStore;
use crate::settings::GameConfig;
use crate::sim::{GameEvent, RoundEngine};

/// `window.localStorage`
#[derive(Debug)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// None in contexts without storage access (sandboxed iframes, some
    /// private modes)
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
    }
}

fn open_storage() -> Box<dyn KeyValueStorage> {
    match LocalStorage::open() {
        Some(storage) => Box::new(storage),
        None => {
            log::warn!("LocalStorage unavailable, progress will not be kept");
            Box::new(MemoryStorage::new())
        }
    }
}

type WebStore = PersistentSessionStore<Box<dyn KeyValueStorage>>;

/// Game handle exported to the page script
#[wasm_bindgen]
pub struct WebGame {
    engine: RoundEngine<WebStore>,
    high_scores: HighScores,
}

#[wasm_bindgen]
impl WebGame {
    /// Build a game over a JSON array of dishes
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: &str) -> Result<WebGame, JsError> {
        let catalog =
            StaticCatalog::from_json(catalog_json).map_err(|e| JsError::new(&e.to_string()))?;
        let storage = open_storage();
        let config = GameConfig::load(&*storage);
        let high_scores = HighScores::load(&*storage);
        let seed = now_ms() as u64;
        let engine = RoundEngine::new(&catalog, PersistentSessionStore::new(storage), config, seed);
        Ok(WebGame {
            engine,
            high_scores,
        })
    }

    pub fn start(&mut self) -> Result<bool, JsError> {
        self.engine
            .start_game()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = playAgain)]
    pub fn play_again(&mut self) -> Result<bool, JsError> {
        self.engine
            .play_again()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn quit(&mut self) {
        self.engine.quit();
    }

    /// Map click; out-of-range positions are clamped, non-finite dropped
    #[wasm_bindgen(js_name = placeGuess)]
    pub fn place_guess(&mut self, lat: f64, lng: f64) -> bool {
        match GeoPoint::new(lat, lng).clamped() {
            Some(position) => self.engine.place_guess(position),
            None => false,
        }
    }

    pub fn submit(&mut self) -> bool {
        self.engine.submit_guess()
    }

    pub fn skip(&mut self) -> bool {
        self.engine.skip()
    }

    pub fn pause(&mut self) -> bool {
        self.engine.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.engine.resume()
    }

    /// Advance by the frame time (ms)
    pub fn update(&mut self, dt_ms: f64) {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.engine.update(Duration::from_secs_f64(dt_ms / 1000.0));
        }
    }

    /// JSON array of events since the last call
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> String {
        let events = self.engine.drain_events();
        for event in &events {
            if let GameEvent::GameFinished { summary } = event {
                if let Some(rank) = self.high_scores.add_summary(summary) {
                    log::info!("New high score, rank {rank}");
                    let storage = self.engine.store_mut().storage_mut();
                    if let Err(e) = self.high_scores.save(storage) {
                        log::warn!("Could not save high scores: {e}");
                    }
                }
            }
        }
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Forget which dishes and images were shown; high scores stay
    #[wasm_bindgen(js_name = resetProgress)]
    pub fn reset_progress(&mut self) -> Result<(), JsError> {
        self.engine
            .store_mut()
            .reset()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.engine.phase())
    }

    #[wasm_bindgen(js_name = highScores)]
    pub fn high_scores(&self) -> String {
        serde_json::to_string(&self.high_scores).unwrap_or_else(|_| "{}".to_string())
    }
}

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Dish Guessr (web) ready");
}
