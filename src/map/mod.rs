//! Map sync adapter.
//!
//! This module contains:
//! - The `MapSurface` trait, the only way to reach a renderer
//! - `MapSync`, which owns the surface for the lifetime of the view
//! - Marker construction (`marker`)
//! - A recording surface for the CLI and tests (`HeadlessSurface`)

mod headless;
pub mod marker;

use std::time::Duration;

use serde::Serialize;

use crate::engine::Event;
use crate::error::Result;
use crate::models::{LatLon, MapConfig};

pub use headless::HeadlessSurface;
pub use marker::{MapSnapshot, Marker, MarkerStyle, build_markers};

/// Initial center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewpoint {
    pub center: LatLon,
    pub zoom: f64,
}

/// Resolved camera move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: LatLon,
    pub zoom: f64,
    pub duration: Duration,
    /// `false` jumps straight to the view
    pub animate: bool,
}

/// Why the camera is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    /// The active row changed
    Select,
    /// A marker was clicked
    Focus,
    Spin,
    /// Back to the last visited place on load
    Restore,
}

/// Camera request emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraCue {
    pub kind: CameraKind,
    pub place: String,
    pub target: LatLon,
}

impl CameraCue {
    pub fn resolve(&self, config: &MapConfig) -> Camera {
        let (zoom, secs, animate) = match self.kind {
            CameraKind::Select => (config.select_zoom, config.select_secs, true),
            CameraKind::Focus => (config.focus_zoom, config.focus_secs, true),
            CameraKind::Spin => (config.spin_zoom, config.spin_secs, true),
            CameraKind::Restore => (config.restore_zoom, 0.0, false),
        };
        Camera {
            center: self.target,
            zoom,
            duration: Duration::from_millis((secs.max(0.0) * 1000.0).round() as u64),
            animate,
        }
    }
}

/// Geospatial renderer capabilities.
pub trait MapSurface: Send {
    fn init(&mut self, viewpoint: Viewpoint) -> Result<()>;

    /// Replace every marker in one call.
    fn set_markers(&mut self, markers: Vec<Marker>);

    fn fly_to(&mut self, camera: Camera);
}

/// Owns the surface and keeps it in step with the engine.
pub struct MapSync<S> {
    surface: S,
    config: MapConfig,
    ready: bool,
    rendered: usize,
}

impl<S: MapSurface> MapSync<S> {
    pub fn new(surface: S, config: MapConfig) -> Self {
        Self {
            surface,
            config,
            ready: false,
            rendered: 0,
        }
    }

    /// Initialize the surface at the default viewpoint. Runs once.
    pub fn mount(&mut self) -> bool {
        if self.ready {
            return true;
        }

        let [lat, lon] = self.config.default_center;
        let Some(center) = LatLon::new(lat, lon) else {
            log::warn!("Default map center {:?} is out of range", self.config.default_center);
            return false;
        };
        let viewpoint = Viewpoint {
            center,
            zoom: self.config.default_zoom,
        };

        match self.surface.init(viewpoint) {
            Ok(()) => {
                self.ready = true;
                log::debug!("Map surface ready at {} zoom {}", center, viewpoint.zoom);
            }
            Err(e) => log::warn!("Map surface failed to initialize: {}", e),
        }
        self.ready
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Rebuild and replace every marker.
    pub fn sync(&mut self, snapshot: &MapSnapshot) {
        if !self.ready {
            log::debug!("Dropping marker sync: surface not ready");
            return;
        }
        let markers = build_markers(snapshot);
        self.rendered = markers.len();
        self.surface.set_markers(markers);
    }

    /// Activation handler for the marker at `index`.
    pub fn activate(&self, index: usize) -> Option<Event> {
        (self.ready && index < self.rendered).then_some(Event::MarkerActivated(index))
    }

    pub fn move_camera(&mut self, cue: &CameraCue) {
        if !self.ready {
            log::debug!("Dropping camera move to {}: surface not ready", cue.place);
            return;
        }
        self.surface.fly_to(cue.resolve(&self.config));
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::VisitedSnapshot;
    use crate::models::Place;

    fn place(name: &str) -> Place {
        Place {
            name: name.into(),
            country: "Somewhere".into(),
            position: LatLon { lat: 10.0, lon: 20.0 },
            adventure: 1,
            study: 2,
            travel: 3,
        }
    }

    fn snapshot() -> MapSnapshot {
        MapSnapshot {
            places: vec![place("Lisbon"), place("Oslo"), place("Lima")],
            active: 0,
            visited: VisitedSnapshot::default(),
        }
    }

    fn cue(kind: CameraKind) -> CameraCue {
        CameraCue {
            kind,
            place: "Lisbon".into(),
            target: LatLon { lat: 38.7, lon: -9.1 },
        }
    }

    #[test]
    fn mount_uses_default_viewpoint() {
        let mut map = MapSync::new(HeadlessSurface::new(), MapConfig::default());
        assert!(map.mount());
        let viewpoint = map.surface().viewpoint().unwrap();
        assert_eq!(viewpoint.center, LatLon { lat: 20.0, lon: 0.0 });
        assert_eq!(viewpoint.zoom, 2.2);
    }

    #[test]
    fn repeated_sync_replaces_markers() {
        let mut map = MapSync::new(HeadlessSurface::new(), MapConfig::default());
        map.mount();

        map.sync(&snapshot());
        let first = map.surface().markers().to_vec();
        map.sync(&snapshot());

        assert_eq!(map.surface().markers(), first.as_slice());
        assert_eq!(map.surface().markers().len(), 3);
        assert_eq!(map.surface().marker_updates(), 2);
    }

    #[test]
    fn requests_before_init_are_dropped() {
        let mut map = MapSync::new(HeadlessSurface::broken(), MapConfig::default());
        assert!(!map.mount());

        map.sync(&snapshot());
        map.move_camera(&cue(CameraKind::Select));

        assert_eq!(map.surface().marker_updates(), 0);
        assert!(map.surface().cameras().is_empty());
        assert_eq!(map.activate(0), None);
    }

    #[test]
    fn cue_resolution() {
        let config = MapConfig::default();
        let select = cue(CameraKind::Select).resolve(&config);
        assert_eq!((select.zoom, select.animate), (4.5, true));
        assert_eq!(select.duration, Duration::from_millis(600));

        let spin = cue(CameraKind::Spin).resolve(&config);
        assert_eq!((spin.zoom, spin.duration), (5.0, Duration::from_millis(1100)));

        let restore = cue(CameraKind::Restore).resolve(&config);
        assert_eq!((restore.zoom, restore.animate), (4.5, false));
        assert_eq!(restore.duration, Duration::ZERO);
    }

    #[test]
    fn activation_only_for_rendered_rows() {
        let mut map = MapSync::new(HeadlessSurface::new(), MapConfig::default());
        map.mount();
        map.sync(&snapshot());

        assert_eq!(map.activate(2), Some(Event::MarkerActivated(2)));
        assert_eq!(map.activate(3), None);
    }
}
