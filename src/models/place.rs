//! Place data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validated lat/lon pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self { lat, lon })
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Case-insensitive identity of a place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaceKey(String);

impl PlaceKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An explorable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Display name, unique within the catalog (case-insensitive)
    pub name: String,

    pub country: String,

    pub position: LatLon,

    /// Attribute scores, each in `0..=100`
    pub adventure: u8,
    pub study: u8,
    pub travel: u8,
}

impl Place {
    pub fn key(&self) -> PlaceKey {
        PlaceKey::new(&self.name)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.key() == PlaceKey::new(name)
    }

    /// Whether a lower-cased search needle hits this place.
    ///
    /// An empty needle matches everything.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.country.to_lowercase().contains(needle)
    }

    /// One-line attribute summary used by tooltips and listings.
    pub fn scores_line(&self) -> String {
        format!(
            "Adventure {} | Study {} | Travel {}",
            self.adventure, self.study, self.travel
        )
    }
}

/// A catalog row as served by `GET cities`.
///
/// Coordinates arrive as either `lat`/`lon` or `latitude`/`longitude`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlace {
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub adventure: Option<f64>,
    #[serde(default)]
    pub study: Option<f64>,
    #[serde(default)]
    pub travel: Option<f64>,
}

impl RawPlace {
    /// Normalize into a [`Place`]; `None` when the name or coordinates are unusable.
    pub fn normalize(self) -> Option<Place> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        let position = LatLon::new(self.lat.or(self.latitude)?, self.lon.or(self.longitude)?)?;

        Some(Place {
            name,
            country: self.country.trim().to_string(),
            position,
            adventure: score(self.adventure),
            study: score(self.study),
            travel: score(self.travel),
        })
    }
}

fn score(raw: Option<f64>) -> u8 {
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}
