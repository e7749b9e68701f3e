// src/services/memory.rs

//! In-process catalog and ledger.
//!
//! Backs the CLI's offline mode and the engine tests. Behaves like the
//! remote API: `mark_visit` toggles, failures surface as network errors.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Place, PlaceKey, RawPlace, UserId, VisitRecord};
use crate::services::catalog::normalize_rows;
use crate::services::ledger::require_place;
use crate::services::{CatalogSource, VisitLedger};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    places: Mutex<Vec<Place>>,
    fail_next: Mutex<Option<String>>,
    loads: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places: Mutex::new(places),
            ..Self::default()
        }
    }

    /// Read a JSON array shaped like the `GET cities` response.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let rows: Vec<RawPlace> = serde_json::from_slice(&bytes)?;
        Ok(Self::new(normalize_rows(rows)))
    }

    /// Make the next `load` fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    pub fn set_places(&self, places: Vec<Place>) {
        *lock(&self.places) = places;
    }

    /// Number of `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn load(&self) -> Result<Vec<Place>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.fail_next).take() {
            return Err(AppError::network(message));
        }
        Ok(lock(&self.places).clone())
    }
}

/// Ledger held in memory, keyed by user.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    visits: Mutex<HashMap<UserId, Vec<VisitRecord>>>,
    fail_next_fetch: Mutex<Option<String>>,
    fail_next_mark: Mutex<Option<String>>,
    fetches: AtomicUsize,
    marks: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's ledger.
    pub fn with_visits(self, user: &UserId, places: &[&str]) -> Self {
        lock(&self.visits).insert(
            user.clone(),
            places.iter().map(|p| VisitRecord::new(*p)).collect(),
        );
        self
    }

    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        *lock(&self.fail_next_fetch) = Some(message.into());
    }

    pub fn fail_next_mark(&self, message: impl Into<String>) {
        *lock(&self.fail_next_mark) = Some(message.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn mark_count(&self) -> usize {
        self.marks.load(Ordering::SeqCst)
    }

    /// Places currently recorded for `user`, in ledger order.
    pub fn visited(&self, user: &UserId) -> Vec<String> {
        lock(&self.visits)
            .get(user)
            .map(|rows| rows.iter().map(|r| r.location.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisitLedger for MemoryLedger {
    async fn fetch_visits(&self, user: &UserId) -> Result<Vec<VisitRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.fail_next_fetch).take() {
            return Err(AppError::network(message));
        }
        Ok(lock(&self.visits).get(user).cloned().unwrap_or_default())
    }

    async fn mark_visit(&self, user: &UserId, place: &str) -> Result<()> {
        let place = require_place(place)?;
        self.marks.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.fail_next_mark).take() {
            return Err(AppError::network(message));
        }

        let key = PlaceKey::new(place);
        let mut visits = lock(&self.visits);
        let rows = visits.entry(user.clone()).or_default();
        match rows.iter().position(|r| PlaceKey::new(&r.location) == key) {
            Some(index) => {
                rows.remove(index);
            }
            None => rows.push(VisitRecord::new(place)),
        }
        Ok(())
    }
}
