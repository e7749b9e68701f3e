// src/runtime.rs

//! Effect runner.
//!
//! Performs the effects returned by [`Explorer::handle`] and feeds async
//! completions back in as events. Network requests and toast timers are kept
//! in one `FuturesUnordered`, so they settle in whatever order they finish.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::broadcast;

use crate::engine::{Effect, Event, ExploreView, Explorer};
use crate::map::{MapSurface, MapSync};
use crate::models::VisitSignal;
use crate::notify::Speaker;
use crate::services::{CatalogSource, VisitLedger};

/// Buffered visit signals per subscriber.
const SIGNAL_CAPACITY: usize = 64;

pub struct Runtime<S> {
    explorer: Explorer,
    map: MapSync<S>,
    catalog: Arc<dyn CatalogSource>,
    ledger: Arc<dyn VisitLedger>,
    speaker: Box<dyn Speaker>,
    signals: broadcast::Sender<VisitSignal>,
    pending: FuturesUnordered<BoxFuture<'static, Event>>,
    stale: bool,
}

impl<S: MapSurface> Runtime<S> {
    pub fn new(
        explorer: Explorer,
        map: MapSync<S>,
        catalog: Arc<dyn CatalogSource>,
        ledger: Arc<dyn VisitLedger>,
        speaker: Box<dyn Speaker>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            explorer,
            map,
            catalog,
            ledger,
            speaker,
            signals,
            pending: FuturesUnordered::new(),
            stale: false,
        }
    }

    /// Initialize the surface and start the initial loads.
    pub fn mount(&mut self) {
        self.map.mount();
        self.dispatch(Event::Mounted);
    }

    /// Run one transition and perform its effects.
    pub fn dispatch(&mut self, event: Event) {
        if self.stale {
            log::debug!("Runtime torn down; dropping {:?}", event);
            return;
        }
        for effect in self.explorer.handle(event) {
            self.perform(effect);
        }
    }

    /// Click on the marker at `index`. `false` if no such marker is rendered.
    pub fn activate_marker(&mut self, index: usize) -> bool {
        match self.map.activate(index) {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Wait for the next completion. `None` once nothing is pending.
    pub async fn next_event(&mut self) -> Option<Event> {
        if self.stale {
            return None;
        }
        self.pending.next().await
    }

    /// Dispatch completions until nothing is pending.
    pub async fn run_until_idle(&mut self) {
        while let Some(event) = self.next_event().await {
            self.dispatch(event);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.stale && !self.pending.is_empty()
    }

    /// Receive a [`VisitSignal`] for every confirmed toggle.
    pub fn subscribe(&self) -> broadcast::Receiver<VisitSignal> {
        self.signals.subscribe()
    }

    /// Stop the view. Pending requests and timers are dropped.
    pub fn teardown(&mut self) {
        if self.stale {
            return;
        }
        self.explorer.handle(Event::TornDown);
        let dropped = self.pending.len();
        self.pending = FuturesUnordered::new();
        self.stale = true;
        log::debug!("Runtime torn down with {} pending operations", dropped);
    }

    pub fn view(&self) -> ExploreView {
        self.explorer.view()
    }

    pub fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    pub fn map(&self) -> &MapSync<S> {
        &self.map
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::LoadCatalog { generation } => {
                let catalog = Arc::clone(&self.catalog);
                self.spawn(async move {
                    let result = catalog.load().await.map_err(|e| e.user_message());
                    Event::CatalogLoaded { generation, result }
                });
            }
            Effect::LoadVisits { user, generation } => {
                let ledger = Arc::clone(&self.ledger);
                self.spawn(async move {
                    let result = ledger.fetch_visits(&user).await.map_err(|e| e.user_message());
                    Event::VisitsLoaded { generation, result }
                });
            }
            Effect::MarkVisit { user, place } => {
                let ledger = Arc::clone(&self.ledger);
                self.spawn(async move {
                    let outcome = ledger
                        .mark_visit(&user, &place)
                        .await
                        .map(|()| Utc::now())
                        .map_err(|e| e.user_message());
                    Event::VisitSettled { place, outcome }
                });
            }
            Effect::SyncMarkers(snapshot) => self.map.sync(&snapshot),
            Effect::MoveCamera(cue) => self.map.move_camera(&cue),
            Effect::ClearToastAfter { ticket, after } => {
                self.spawn(async move {
                    tokio::time::sleep(after).await;
                    Event::ToastExpired(ticket)
                });
            }
            Effect::PlaySound(cue) => self.speaker.play(cue),
            Effect::Broadcast(signal) => {
                if self.signals.send(signal).is_err() {
                    log::debug!("No visit signal subscribers");
                }
            }
        }
    }

    fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = Event> + Send + 'static,
    {
        self.pending.push(future.boxed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExploreContext;
    use crate::map::HeadlessSurface;
    use crate::models::{LatLon, MapConfig, Place, UserId};
    use crate::notify::{Cue, RecordingSpeaker};
    use crate::services::{MemoryCatalog, MemoryLedger};

    fn place(name: &str, lat: f64) -> Place {
        Place {
            name: name.into(),
            country: "Testland".into(),
            position: LatLon { lat, lon: 0.0 },
            adventure: 50,
            study: 50,
            travel: 50,
        }
    }

    fn user() -> UserId {
        UserId::new("3").unwrap()
    }

    struct Harness {
        runtime: Runtime<HeadlessSurface>,
        catalog: Arc<MemoryCatalog>,
        ledger: Arc<MemoryLedger>,
        speaker: RecordingSpeaker,
    }

    fn harness(user: Option<UserId>, ledger: MemoryLedger) -> Harness {
        let catalog = Arc::new(MemoryCatalog::new(vec![
            place("Lisbon", 38.7),
            place("Oslo", 59.9),
            place("Lima", -12.0),
        ]));
        let ledger = Arc::new(ledger);
        let speaker = RecordingSpeaker::new();
        let explorer = Explorer::new(ExploreContext {
            user,
            seed: Some(1),
            ..ExploreContext::default()
        });
        let runtime = Runtime::new(
            explorer,
            MapSync::new(HeadlessSurface::new(), MapConfig::default()),
            catalog.clone(),
            ledger.clone(),
            Box::new(speaker.clone()),
        );
        Harness {
            runtime,
            catalog,
            ledger,
            speaker,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mount_without_user_never_reads_ledger() {
        let mut h = harness(None, MemoryLedger::new());
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        assert_eq!(h.ledger.fetch_count(), 0);
        assert_eq!(h.catalog.load_count(), 1);
        assert!(h.runtime.view().visited_places.is_empty());
        assert_eq!(h.runtime.map().surface().markers().len(), 3);
        assert_eq!(h.speaker.played(), vec![Cue::PageLoad]);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_restores_last_visit() {
        let ledger = MemoryLedger::new().with_visits(&user(), &["Lisbon", "Lima"]);
        let mut h = harness(Some(user()), ledger);
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        let surface = h.runtime.map().surface();
        let camera = surface.last_camera().unwrap();
        assert!(!camera.animate);
        assert_eq!(camera.center.lat, -12.0);
        assert_eq!(h.runtime.explorer().selection().active(), 2);
        assert_eq!(surface.markers().iter().filter(|m| m.visited).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_toggle_broadcasts_and_toast_expires() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        let mut signals = h.runtime.subscribe();
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        h.runtime.dispatch(Event::ToggleRequested("Oslo".into()));
        // Settle the write only; the toast timer is still pending.
        let settled = h.runtime.next_event().await.unwrap();
        h.runtime.dispatch(settled);
        assert_eq!(h.runtime.view().toast.as_deref(), Some("Marked Oslo as visited"));

        let signal = signals.try_recv().unwrap();
        assert_eq!(signal.city, "Oslo");
        assert_eq!(signal.user_id, user());
        assert_eq!(h.ledger.visited(&user()), vec!["Oslo"]);

        h.runtime.run_until_idle().await;
        assert!(h.runtime.view().toast.is_none());
        assert!(h.speaker.played().contains(&Cue::Ping(Cue::VISIT_HZ)));
    }

    #[tokio::test(start_paused = true)]
    async fn double_toggle_sends_one_write() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        h.runtime.dispatch(Event::ToggleRequested("Lima".into()));
        h.runtime.dispatch(Event::ToggleRequested("Lima".into()));
        h.runtime.run_until_idle().await;

        assert_eq!(h.ledger.mark_count(), 1);
        assert!(h.runtime.explorer().visited().contains("Lima"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_leaves_set_and_surfaces_error() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        let mut signals = h.runtime.subscribe();
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        h.ledger.fail_next_mark("Unable to mark visited");
        h.runtime.dispatch(Event::ToggleActive);
        h.runtime.run_until_idle().await;

        let view = h.runtime.view();
        assert_eq!(view.error.as_deref(), Some("Unable to mark visited"));
        assert!(view.visited_places.is_empty());
        assert!(view.toast.is_none());
        assert!(signals.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn marker_click_focuses_and_toggles() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        assert!(h.runtime.activate_marker(1));
        assert!(!h.runtime.activate_marker(9));
        h.runtime.run_until_idle().await;

        let cameras = h.runtime.map().surface().cameras();
        let last = cameras.last().unwrap();
        assert_eq!(last.center.lat, 59.9);
        assert_eq!(last.zoom, 5.0);
        assert!(h.runtime.explorer().visited().contains("Oslo"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_drops_pending_writes() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        h.runtime.dispatch(Event::ToggleRequested("Lisbon".into()));
        assert!(h.runtime.has_pending());
        h.runtime.teardown();

        assert!(h.runtime.next_event().await.is_none());
        h.runtime.dispatch(Event::SpinRequested);
        assert_eq!(h.ledger.mark_count(), 0);
        assert!(h.runtime.explorer().is_stale());
        assert!(!h.runtime.explorer().visited().contains("Lisbon"));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_during_write_agrees_with_ledger() {
        let mut h = harness(Some(user()), MemoryLedger::new());
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        h.runtime.dispatch(Event::ToggleRequested("Oslo".into()));
        h.runtime.dispatch(Event::RefreshRequested);
        h.runtime.run_until_idle().await;

        assert_eq!(h.ledger.visited(&user()), vec!["Oslo"]);
        assert_eq!(h.runtime.view().visited_places, vec!["Oslo"]);
    }

    #[tokio::test(start_paused = true)]
    async fn visits_failure_clears_on_refresh_with_new_places() {
        let ledger = MemoryLedger::new().with_visits(&user(), &["Lima"]);
        ledger.fail_next_fetch("Failed to load visits");
        let mut h = harness(Some(user()), ledger);
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        let view = h.runtime.view();
        assert!(view.ready);
        assert_eq!(view.visits_error.as_deref(), Some("Failed to load visits"));
        assert!(view.visited_places.is_empty());

        h.catalog.set_places(vec![
            place("Lisbon", 38.7),
            place("Oslo", 59.9),
            place("Lima", -12.0),
            place("Quito", -0.2),
        ]);
        h.runtime.dispatch(Event::RefreshRequested);
        h.runtime.run_until_idle().await;

        let view = h.runtime.view();
        assert!(view.visits_error.is_none());
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.visited_places, vec!["Lima"]);
        assert_eq!(h.ledger.fetch_count(), 2);
        assert_eq!(h.runtime.map().surface().markers().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_is_reported_and_refresh_recovers() {
        let mut h = harness(None, MemoryLedger::new());
        h.catalog.fail_next("Failed to load places");
        h.runtime.mount();
        h.runtime.run_until_idle().await;

        let view = h.runtime.view();
        assert!(view.ready);
        assert!(view.rows.is_empty());
        assert_eq!(view.error.as_deref(), Some("Failed to load places"));

        h.runtime.dispatch(Event::RefreshRequested);
        h.runtime.run_until_idle().await;
        let view = h.runtime.view();
        assert_eq!(view.rows.len(), 3);
        assert!(view.error.is_none());
        let camera = h.runtime.map().surface().last_camera().unwrap();
        assert!(camera.animate);
        assert_eq!(camera.zoom, 4.5);
    }
}
