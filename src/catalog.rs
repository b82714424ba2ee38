//! Dish catalog
//!
//! The catalog is owned by an external ingestion pipeline; the game only
//! reads it. A dish needs a stable id, coordinates and at least one image
//! to be playable.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::geo::GeoPoint;

/// Stable dish identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DishId(pub String);

impl DishId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DishId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A guessable dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Image references (URLs or asset paths), order is significant
    #[serde(default)]
    pub images: Vec<String>,
    /// Human readable origin, e.g. "Oaxaca, Mexico"
    #[serde(default)]
    pub origin_label: String,
    #[serde(default)]
    pub description: String,
}

impl Dish {
    /// Where the dish comes from
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Dishes without any image can never be shown
    pub fn is_eligible(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

/// Read interface onto whatever stores the dishes
pub trait ContentCatalog {
    fn dishes(&self) -> Vec<Dish>;
}

/// Catalog held in memory, typically deserialized from a JSON export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    dishes: Vec<Dish>,
}

impl StaticCatalog {
    pub fn new(dishes: Vec<Dish>) -> Self {
        Self { dishes }
    }

    /// Parse a JSON array of dishes
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let dishes: Vec<Dish> = serde_json::from_str(json)?;
        log::info!("Loaded catalog with {} dishes", dishes.len());
        Ok(Self { dishes })
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }
}

impl ContentCatalog for StaticCatalog {
    fn dishes(&self) -> Vec<Dish> {
        self.dishes.clone()
    }
}
