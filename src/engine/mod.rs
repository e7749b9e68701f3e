//! Exploration state engine.
//!
//! `Explorer` is a synchronous state machine: every user action and every
//! async completion arrives as an [`Event`], and each transition returns the
//! [`Effect`]s the runtime must perform. Nothing in this module touches the
//! network, the clock or the map surface directly.

pub mod progress;
pub mod selection;
pub mod visited;

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::error::AppError;
use crate::map::{CameraCue, CameraKind, MapSnapshot};
use crate::models::{Config, Place, PlaceKey, UserId, VisitRecord, VisitSignal};
use crate::notify::{self, Cue, Ticket, Toaster};

pub use progress::{MilestoneChip, Progress};
pub use selection::{Direction, Selection};
pub use visited::{PendingToggle, ToggleRejected, VisitedSet, VisitedSnapshot};

/// Everything the engine needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct ExploreContext {
    /// Logged-in or guest user; `None` disables the ledger entirely
    pub user: Option<UserId>,
    pub sound_enabled: bool,
    pub visit_toast: Duration,
    pub milestone_toast: Duration,
    /// Fixed seed for spin, for reproducible runs
    pub seed: Option<u64>,
}

impl Default for ExploreContext {
    fn default() -> Self {
        Self::from_config(&Config::default(), None)
    }
}

impl ExploreContext {
    pub fn from_config(config: &Config, user: Option<UserId>) -> Self {
        Self {
            user,
            sound_enabled: config.settings.sound_enabled,
            visit_toast: config.notify.visit_toast(),
            milestone_toast: config.notify.milestone_toast(),
            seed: None,
        }
    }
}

/// Inputs to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Mounted,
    RefreshRequested,
    /// Completion of the load started with the same `generation`
    CatalogLoaded {
        generation: u64,
        result: Result<Vec<Place>, String>,
    },
    VisitsLoaded {
        generation: u64,
        result: Result<Vec<VisitRecord>, String>,
    },
    QueryChanged(String),
    SelectionMoved(Direction),
    SelectionJumped(usize),
    SpinRequested,
    /// A marker on the surface was clicked
    MarkerActivated(usize),
    ToggleActive,
    ToggleRequested(String),
    VisitSettled {
        place: String,
        outcome: Result<DateTime<Utc>, String>,
    },
    ToastExpired(Ticket),
    TornDown,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadCatalog { generation: u64 },
    LoadVisits { user: UserId, generation: u64 },
    MarkVisit { user: UserId, place: String },
    SyncMarkers(MapSnapshot),
    MoveCamera(CameraCue),
    ClearToastAfter { ticket: Ticket, after: Duration },
    PlaySound(Cue),
    Broadcast(VisitSignal),
}

/// Progress of one of the two initial loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// One row of the place list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRow {
    pub name: String,
    pub country: String,
    pub active: bool,
    pub visited: bool,
    pub pending: bool,
    pub adventure: u8,
    pub study: u8,
    pub travel: u8,
}

/// Read model for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreView {
    pub query: String,
    pub rows: Vec<PlaceRow>,
    pub active: Option<Place>,
    pub progress: Progress,
    pub milestones: Vec<MilestoneChip>,
    /// Visited places in catalog order
    pub visited_places: Vec<String>,
    pub toast: Option<String>,
    pub error: Option<String>,
    pub visits_error: Option<String>,
    pub loading: bool,
    pub ready: bool,
}

pub struct Explorer {
    ctx: ExploreContext,
    selection: Selection,
    visited: VisitedSet,
    toaster: Toaster,
    rng: StdRng,
    catalog_state: LoadState,
    visits_state: LoadState,
    /// Bumped by every load request; older completions are discarded
    generation: u64,
    catalog_settled: bool,
    visits_settled: bool,
    mounted: bool,
    ready: bool,
    stale: bool,
    error: Option<String>,
    visits_error: Option<String>,
    camera: Option<CameraCue>,
    last_synced: Option<MapSnapshot>,
}

impl Explorer {
    pub fn new(ctx: ExploreContext) -> Self {
        let rng = match ctx.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ctx,
            selection: Selection::new(),
            visited: VisitedSet::new(),
            toaster: Toaster::new(),
            rng,
            catalog_state: LoadState::Idle,
            visits_state: LoadState::Idle,
            generation: 0,
            catalog_settled: false,
            visits_settled: false,
            mounted: false,
            ready: false,
            stale: false,
            error: None,
            visits_error: None,
            camera: None,
            last_synced: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn visited(&self) -> VisitedSnapshot {
        self.visited.snapshot()
    }

    /// Both initial loads have settled.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn progress(&self) -> Progress {
        progress::compute(self.visited.len())
    }

    /// Run one transition.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        if self.stale {
            log::debug!("Discarding {:?}: view torn down", event);
            return Vec::new();
        }

        let prev_active = self.selection.active_place().map(Place::key);
        let mut effects = Vec::new();

        match event {
            Event::Mounted => self.on_mounted(&mut effects),
            Event::RefreshRequested => self.request_loads(&mut effects),
            Event::CatalogLoaded { generation, result } => {
                if self.is_current(generation, "catalog") {
                    self.on_catalog(result);
                }
            }
            Event::VisitsLoaded { generation, result } => {
                if self.is_current(generation, "visits") {
                    self.on_visits(result, &mut effects);
                }
            }
            Event::QueryChanged(text) => self.selection.set_query(&text),
            Event::SelectionMoved(direction) => {
                self.selection.move_by(direction);
            }
            Event::SelectionJumped(index) => {
                self.selection.jump_to(index);
            }
            Event::SpinRequested => self.on_spin(),
            Event::MarkerActivated(index) => self.on_marker(index, &mut effects),
            Event::ToggleActive => {
                if let Some(name) = self.selection.active_place().map(|p| p.name.clone()) {
                    self.request_toggle(&name, &mut effects);
                }
            }
            Event::ToggleRequested(name) => {
                let name = self
                    .selection
                    .catalog()
                    .iter()
                    .find(|p| p.is_named(&name))
                    .map_or_else(|| name.trim().to_string(), |p| p.name.clone());
                self.request_toggle(&name, &mut effects);
            }
            Event::VisitSettled { place, outcome } => {
                self.on_visit_settled(place, outcome, &mut effects)
            }
            Event::ToastExpired(ticket) => {
                self.toaster.expire(ticket);
            }
            Event::TornDown => {
                self.stale = true;
                self.camera = None;
                log::debug!("Explorer torn down");
                return effects;
            }
        }

        self.settle(prev_active, &mut effects);
        effects
    }

    pub fn view(&self) -> ExploreView {
        let visited = self.visited.snapshot();
        let active_row = (!self.selection.is_empty()).then(|| self.selection.active());
        let rows = self
            .selection
            .filtered()
            .enumerate()
            .map(|(row, place)| PlaceRow {
                name: place.name.clone(),
                country: place.country.clone(),
                active: Some(row) == active_row,
                visited: visited.contains(&place.name),
                pending: self.visited.is_pending(&place.name),
                adventure: place.adventure,
                study: place.study,
                travel: place.travel,
            })
            .collect();
        let visited_places = self
            .selection
            .catalog()
            .iter()
            .filter(|p| visited.contains(&p.name))
            .map(|p| p.name.clone())
            .collect();

        ExploreView {
            query: self.selection.query().to_string(),
            rows,
            active: self.selection.active_place().cloned(),
            progress: self.progress(),
            milestones: progress::milestone_chips(visited.len()),
            visited_places,
            toast: self.toaster.current().map(|t| t.message.clone()),
            error: self.error.clone(),
            visits_error: self.visits_error.clone(),
            loading: self.catalog_state == LoadState::Loading
                || self.visits_state == LoadState::Loading,
            ready: self.ready,
        }
    }

    fn on_mounted(&mut self, effects: &mut Vec<Effect>) {
        if self.mounted {
            log::debug!("Ignoring repeated mount");
            return;
        }
        self.mounted = true;
        self.play(Cue::PageLoad, effects);
        self.request_loads(effects);
    }

    fn request_loads(&mut self, effects: &mut Vec<Effect>) {
        self.generation += 1;
        let generation = self.generation;
        self.catalog_state = LoadState::Loading;
        effects.push(Effect::LoadCatalog { generation });

        match &self.ctx.user {
            Some(user) => {
                self.visits_state = LoadState::Loading;
                effects.push(Effect::LoadVisits {
                    user: user.clone(),
                    generation,
                });
            }
            None => {
                self.visits_state = LoadState::Loaded;
                self.visits_settled = true;
            }
        }
    }

    fn is_current(&self, generation: u64, what: &str) -> bool {
        if generation != self.generation {
            log::debug!(
                "Discarding {} load {} superseded by {}",
                what,
                generation,
                self.generation
            );
            return false;
        }
        true
    }

    fn on_catalog(&mut self, result: Result<Vec<Place>, String>) {
        self.catalog_settled = true;
        match result {
            Ok(places) => {
                self.catalog_state = LoadState::Loaded;
                self.error = None;
                self.selection.set_catalog(places);
            }
            Err(message) => {
                log::warn!("Catalog load failed: {}", message);
                self.catalog_state = LoadState::Failed;
                self.error = Some(message);
            }
        }
    }

    fn on_visits(&mut self, result: Result<Vec<VisitRecord>, String>, effects: &mut Vec<Effect>) {
        self.visits_settled = true;
        match result {
            Ok(records) => {
                let prev = self.visited.len();
                self.visited.replace_from_records(&records);
                self.visits_state = LoadState::Loaded;
                self.visits_error = None;
                log::debug!("Loaded {} visited places", self.visited.len());
                self.check_milestone(prev, effects);
            }
            Err(message) => {
                log::warn!("Visits load failed: {}", message);
                self.visits_state = LoadState::Failed;
                self.visits_error = Some(message);
            }
        }
    }

    fn on_spin(&mut self) {
        if let Some(place) = self.selection.spin(&mut self.rng) {
            log::debug!("Spin landed on {}", place.name);
            self.camera = Some(cue(CameraKind::Spin, &place));
        }
    }

    fn on_marker(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(place) = self.selection.get(index).cloned() else {
            log::debug!("Ignoring activation of unknown marker {}", index);
            return;
        };
        self.selection.jump_to(index);
        self.camera = Some(cue(CameraKind::Focus, &place));
        self.request_toggle(&place.name, effects);
    }

    fn request_toggle(&mut self, place: &str, effects: &mut Vec<Effect>) {
        match self.visited.begin_toggle(self.ctx.user.as_ref(), place) {
            Ok(PendingToggle { user, place }) => {
                effects.push(Effect::MarkVisit { user, place });
            }
            Err(ToggleRejected::IdentityRequired) => {
                self.error = Some(AppError::IdentityRequired.user_message());
            }
            Err(ToggleRejected::AlreadyPending) => {
                log::debug!("Toggle of {} already in flight; ignoring", place);
            }
        }
    }

    fn on_visit_settled(
        &mut self,
        place: String,
        outcome: Result<DateTime<Utc>, String>,
        effects: &mut Vec<Effect>,
    ) {
        let at = match outcome {
            Ok(at) => at,
            Err(message) => {
                log::warn!("Visit toggle for {} failed: {}", place, message);
                self.visited.abandon(&place);
                self.error = Some(message);
                return;
            }
        };

        let prev = self.visited.len();
        let now_visited = self.visited.commit(&place);
        self.error = None;

        self.play(Cue::Ping(Cue::VISIT_HZ), effects);
        self.toast(
            notify::visit_message(&place, now_visited),
            self.ctx.visit_toast,
            effects,
        );
        if let Some(user) = &self.ctx.user {
            effects.push(Effect::Broadcast(VisitSignal {
                city: place,
                user_id: user.clone(),
                at,
            }));
        }
        self.check_milestone(prev, effects);
    }

    fn check_milestone(&mut self, prev: usize, effects: &mut Vec<Effect>) {
        let Some(count) = progress::milestone_reached(prev, self.visited.len()) else {
            return;
        };
        log::info!("Milestone reached: {} places", count);
        self.toast(
            notify::milestone_message(count),
            self.ctx.milestone_toast,
            effects,
        );
        self.play(Cue::Ping(Cue::MILESTONE_HZ), effects);
        self.play(Cue::Achievement, effects);
    }

    fn toast(&mut self, message: String, after: Duration, effects: &mut Vec<Effect>) {
        let ticket = self.toaster.show(message);
        effects.push(Effect::ClearToastAfter { ticket, after });
    }

    fn play(&self, cue: Cue, effects: &mut Vec<Effect>) {
        if self.ctx.sound_enabled {
            effects.push(Effect::PlaySound(cue));
        }
    }

    /// Emit camera and marker effects for whatever the transition changed.
    fn settle(&mut self, prev_active: Option<PlaceKey>, effects: &mut Vec<Effect>) {
        let explicit = self.camera.take();

        if !self.ready {
            if !(self.catalog_settled && self.visits_settled) {
                return;
            }
            self.ready = true;
            self.restore(effects);
        } else if let Some(explicit) = explicit {
            effects.push(Effect::MoveCamera(explicit));
        } else if self.selection.active_place().map(Place::key) != prev_active {
            if let Some(place) = self.selection.active_place() {
                effects.push(Effect::MoveCamera(cue(CameraKind::Select, place)));
            }
        }

        let snapshot = MapSnapshot {
            places: self.selection.filtered().cloned().collect(),
            active: self.selection.active(),
            visited: self.visited.snapshot(),
        };
        if self.last_synced.as_ref() != Some(&snapshot) {
            self.last_synced = Some(snapshot.clone());
            effects.push(Effect::SyncMarkers(snapshot));
        }
    }

    /// First readiness: put the cursor back on the last visited place.
    fn restore(&mut self, effects: &mut Vec<Effect>) {
        let restored = self
            .visited
            .last_visited()
            .and_then(|name| self.selection.position_of(name));

        let kind = match restored {
            Some(row) => {
                self.selection.jump_to(row);
                CameraKind::Restore
            }
            None => CameraKind::Select,
        };
        if let Some(place) = self.selection.active_place() {
            log::debug!("View ready; centering on {}", place.name);
            effects.push(Effect::MoveCamera(cue(kind, place)));
        }
    }
}

fn cue(kind: CameraKind, place: &Place) -> CameraCue {
    CameraCue {
        kind,
        place: place.name.clone(),
        target: place.position,
    }
}
