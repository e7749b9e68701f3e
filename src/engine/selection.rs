// src/engine/selection.rs

//! Search filter and cursor over the place catalog.
//!
//! The filtered list is stored as indices into the catalog so a catalog
//! swap never leaves a row pointing at a stale place.

use std::sync::Arc;

use rand::Rng;

use crate::models::Place;

/// Cursor movement on the two-column place grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn offset(self) -> isize {
        match self {
            Self::Left => -1,
            Self::Right => 1,
            Self::Up => -2,
            Self::Down => 2,
        }
    }
}

/// Catalog, query, filtered rows and the active row.
#[derive(Debug, Clone)]
pub struct Selection {
    catalog: Arc<[Place]>,
    query: String,
    needle: String,
    filtered: Vec<usize>,
    active: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            catalog: Arc::from(Vec::new()),
            query: String::new(),
            needle: String::new(),
            filtered: Vec::new(),
            active: 0,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog wholesale.
    pub fn set_catalog(&mut self, places: impl Into<Arc<[Place]>>) {
        self.catalog = places.into();
        self.refilter();
    }

    /// Update the search text. The cursor stays put unless the list shrank past it.
    pub fn set_query(&mut self, text: &str) {
        self.query = text.to_string();
        self.needle = text.trim().to_lowercase();
        self.refilter();
    }

    /// Move the cursor; no-op on an empty list. Returns the new index.
    pub fn move_by(&mut self, direction: Direction) -> usize {
        if let Some(last) = self.last_index() {
            let target = self.active as isize + direction.offset();
            self.active = target.clamp(0, last as isize) as usize;
        }
        self.active
    }

    /// Absolute cursor placement, clamped into the list.
    pub fn jump_to(&mut self, index: usize) -> usize {
        self.active = self.clamp(index);
        self.active
    }

    /// Draw a random place from the whole catalog, ignoring the query.
    ///
    /// The cursor follows the drawn place when it is visible, otherwise it
    /// lands on the drawn index clamped into the filtered list.
    pub fn spin<R: Rng>(&mut self, rng: &mut R) -> Option<Place> {
        if self.catalog.is_empty() {
            return None;
        }
        let drawn = rng.gen_range(0..self.catalog.len());
        self.active = match self.filtered.iter().position(|&i| i == drawn) {
            Some(row) => row,
            None => self.clamp(drawn),
        };
        self.catalog.get(drawn).cloned()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    pub fn catalog(&self) -> &Arc<[Place]> {
        &self.catalog
    }

    pub fn active_place(&self) -> Option<&Place> {
        self.get(self.active)
    }

    /// Place at a filtered row.
    pub fn get(&self, row: usize) -> Option<&Place> {
        self.filtered.get(row).and_then(|&i| self.catalog.get(i))
    }

    /// Filtered row of the place called `name`, if visible.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.filtered().position(|p| p.is_named(name))
    }

    /// Visible places in catalog order.
    pub fn filtered(&self) -> impl Iterator<Item = &Place> + '_ {
        self.filtered.iter().filter_map(|&i| self.catalog.get(i))
    }

    fn refilter(&mut self) {
        self.filtered = self
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, place)| place.matches(&self.needle))
            .map(|(i, _)| i)
            .collect();
        self.active = self.clamp(self.active);
    }

    fn last_index(&self) -> Option<usize> {
        self.filtered.len().checked_sub(1)
    }

    fn clamp(&self, index: usize) -> usize {
        self.last_index().map_or(0, |last| index.min(last))
    }
}
