// src/map/marker.rs

//! Marker construction.
//!
//! A marker is a pure function of (place, is-active, is-visited). The whole
//! set is rebuilt on every sync and replaces the previous one.

use serde::Serialize;

use crate::engine::VisitedSnapshot;
use crate::models::{LatLon, Place};

const ACTIVE_STROKE: &str = "#ffde2f";
const NORMAL_STROKE: &str = "#7fd8be";
const VISITED_FILL: &str = "#3fbf8c";
const UNVISITED_FILL: &str = "#f7c948";
const FILL_OPACITY: f64 = 0.9;

/// Everything needed to rebuild the markers.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    /// Filtered places, in list order
    pub places: Vec<Place>,
    pub active: usize,
    pub visited: VisitedSnapshot,
}

/// Circle marker styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub radius: u32,
    pub stroke: &'static str,
    pub weight: u32,
    pub fill: &'static str,
    pub fill_opacity: f64,
    pub class: &'static str,
}

impl MarkerStyle {
    pub fn for_state(active: bool, visited: bool) -> Self {
        let (radius, stroke, weight) = if active {
            (10, ACTIVE_STROKE, 3)
        } else {
            (7, NORMAL_STROKE, 2)
        };
        let (fill, class) = if visited {
            (VISITED_FILL, "marker-glow")
        } else {
            (UNVISITED_FILL, "marker-pulse")
        };

        Self {
            radius,
            stroke,
            weight,
            fill,
            fill_opacity: FILL_OPACITY,
            class,
        }
    }
}

/// One marker on the surface. `index` is the filtered row it activates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub place: String,
    pub position: LatLon,
    pub active: bool,
    pub visited: bool,
    pub style: MarkerStyle,
    pub tooltip: String,
}

pub fn tooltip(place: &Place) -> String {
    format!("{} — {}\n{}", place.name, place.country, place.scores_line())
}

pub fn build_markers(snapshot: &MapSnapshot) -> Vec<Marker> {
    snapshot
        .places
        .iter()
        .enumerate()
        .map(|(index, place)| {
            let active = index == snapshot.active;
            let visited = snapshot.visited.contains(&place.name);
            Marker {
                index,
                place: place.name.clone(),
                position: place.position,
                active,
                visited,
                style: MarkerStyle::for_state(active, visited),
                tooltip: tooltip(place),
            }
        })
        .collect()
}
