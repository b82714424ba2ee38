//! Cross-game memory of what the player has already seen
//!
//! The record survives restarts and grows only within fixed caps: dish ids
//! reset when the catalog is exhausted, image histories are bounded by each
//! dish's image count, and recent-game history keeps the last 18 ids.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{field_or_default, read_payload, storage_key, write_value};
use crate::catalog::DishId;
use crate::consts::RECENT_HISTORY_CAP;
use crate::error::StorageError;
use crate::platform::{KeyValueStorage, MemoryStorage};

/// Persisted selection history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    /// Dishes shown since the last catalog exhaustion
    pub used_dish_ids: BTreeSet<DishId>,
    /// Image indices per dish in usage order, oldest first
    pub used_images_by_dish: BTreeMap<DishId, Vec<usize>>,
    /// Dishes from the last few completed games, oldest first
    pub recent_dish_ids: VecDeque<DishId>,
    pub last_completed_game_dish_ids: Vec<DishId>,
}

impl SessionRecord {
    /// Decode a stored record one field at a time.
    ///
    /// A broken field only loses that field; everything else still loads.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(obj) = value else {
            log::warn!("Stored session is not an object, starting fresh");
            return Self::default();
        };

        let mut record = Self {
            used_dish_ids: field_or_default(&obj, "used_dish_ids"),
            used_images_by_dish: field_or_default(&obj, "used_images_by_dish"),
            recent_dish_ids: field_or_default(&obj, "recent_dish_ids"),
            last_completed_game_dish_ids: field_or_default(&obj, "last_completed_game_dish_ids"),
        };
        record.trim_recent(RECENT_HISTORY_CAP);
        record
    }

    /// Remember the dishes of a finished game
    pub fn record_game_completion(&mut self, dish_ids: &[DishId], cap: usize) {
        self.recent_dish_ids.extend(dish_ids.iter().cloned());
        self.trim_recent(cap);
        self.last_completed_game_dish_ids = dish_ids.to_vec();
    }

    /// Image history for a dish, oldest first
    pub fn image_history(&self, id: &DishId) -> &[usize] {
        self.used_images_by_dish
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn trim_recent(&mut self, cap: usize) {
        while self.recent_dish_ids.len() > cap {
            self.recent_dish_ids.pop_front();
        }
    }
}

/// Where the session record lives
pub trait SessionStore {
    /// Current record; defaults when nothing usable is stored. Never fails.
    fn load(&self) -> SessionRecord;

    /// Durably replace the stored record
    fn save(&mut self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Load, mutate and save as one step.
    ///
    /// A failed write is logged and the mutation result still returned;
    /// losing one write only costs some repetition later.
    fn update_session<R>(&mut self, f: impl FnOnce(&mut SessionRecord) -> R) -> R
    where
        Self: Sized,
    {
        let mut record = self.load();
        let result = f(&mut record);
        if let Err(e) = self.save(&record) {
            log::warn!("Session write failed: {e}");
        }
        result
    }

    /// Append a finished game's dishes to the recent history
    fn record_game_completion(&mut self, dish_ids: &[DishId])
    where
        Self: Sized,
    {
        self.update_session(|record| record.record_game_completion(dish_ids, RECENT_HISTORY_CAP));
        log::info!("Recorded completed game ({} dishes)", dish_ids.len());
    }
}

/// In-memory store, for tests and hosts that do not persist
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    record: SessionRecord,
    writes: usize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saves so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> SessionRecord {
        self.record.clone()
    }

    fn save(&mut self, record: &SessionRecord) -> Result<(), StorageError> {
        self.record = record.clone();
        self.writes += 1;
        Ok(())
    }
}

/// Session record kept in a key/value backend under a versioned envelope.
///
/// The backend is read once on construction. From then on the in-memory
/// copy is authoritative and every save is written through; a write that
/// fails still updates the copy, so rotation keeps working for the rest of
/// the run.
#[derive(Debug, Clone)]
pub struct PersistentSessionStore<K> {
    storage: K,
    key: String,
    record: SessionRecord,
}

impl<K: KeyValueStorage> PersistentSessionStore<K> {
    /// Storage name of the session record
    pub const NAME: &'static str = "session";

    pub fn new(storage: K) -> Self {
        let key = storage_key(Self::NAME);
        let record = match read_payload(&storage, &key) {
            Some(payload) => SessionRecord::from_value(payload),
            None => SessionRecord::default(),
        };
        log::info!(
            "Session loaded: {} dishes used, {} recent",
            record.used_dish_ids.len(),
            record.recent_dish_ids.len()
        );
        Self {
            storage,
            key,
            record,
        }
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut K {
        &mut self.storage
    }

    pub fn into_storage(self) -> K {
        self.storage
    }

    /// Forget everything the player has seen
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.record = SessionRecord::default();
        self.storage.remove(&self.key)?;
        log::info!("Session history cleared");
        Ok(())
    }
}

impl PersistentSessionStore<MemoryStorage> {
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl<K: KeyValueStorage> SessionStore for PersistentSessionStore<K> {
    fn load(&self) -> SessionRecord {
        self.record.clone()
    }

    fn save(&mut self, record: &SessionRecord) -> Result<(), StorageError> {
        self.record = record.clone();
        write_value(&mut self.storage, &self.key, record)
    }
}
