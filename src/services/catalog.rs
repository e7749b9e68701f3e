// src/services/catalog.rs

//! Place catalog loader.
//!
//! Fetches `GET cities` and normalizes every row into a [`Place`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Place, RawPlace};
use crate::services::ApiClient;

/// Anything that can produce the full place catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load the whole catalog. The result replaces any previous catalog.
    async fn load(&self) -> Result<Vec<Place>>;
}

/// Catalog served by the remote API.
pub struct HttpCatalog {
    api: Arc<ApiClient>,
}

impl HttpCatalog {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn load(&self) -> Result<Vec<Place>> {
        let rows: Vec<RawPlace> = self
            .api
            .get_json("cities", &[], "Failed to load places")
            .await?;
        let places = normalize_rows(rows);
        log::info!("Loaded {} places", places.len());
        Ok(places)
    }
}

/// Normalize raw rows, dropping unusable and duplicate entries.
///
/// Catalog order is preserved; the first row wins for a repeated name.
pub fn normalize_rows(rows: Vec<RawPlace>) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut places = Vec::with_capacity(rows.len());

    for row in rows {
        let name = row.name.clone();
        let Some(place) = row.normalize() else {
            log::warn!("Skipping catalog row {:?}: missing name or coordinates", name);
            continue;
        };
        if seen.insert(place.key()) {
            places.push(place);
        } else {
            log::debug!("Skipping duplicate catalog row {:?}", name);
        }
    }
    places
}
