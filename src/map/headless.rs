// src/map/headless.rs

//! Surface without a renderer. Records what it was asked to draw.

use crate::error::{AppError, Result};
use crate::map::{Camera, Marker, MapSurface, Viewpoint};

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    viewpoint: Option<Viewpoint>,
    markers: Vec<Marker>,
    cameras: Vec<Camera>,
    marker_updates: usize,
    fail_init: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose `init` fails.
    pub fn broken() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn viewpoint(&self) -> Option<&Viewpoint> {
        self.viewpoint.as_ref()
    }

    /// Markers currently on the surface.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Every camera move, oldest first.
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn last_camera(&self) -> Option<&Camera> {
        self.cameras.last()
    }

    /// Number of `set_markers` calls.
    pub fn marker_updates(&self) -> usize {
        self.marker_updates
    }
}

impl MapSurface for HeadlessSurface {
    fn init(&mut self, viewpoint: Viewpoint) -> Result<()> {
        if self.fail_init {
            return Err(AppError::config("map surface unavailable"));
        }
        self.viewpoint = Some(viewpoint);
        Ok(())
    }

    fn set_markers(&mut self, markers: Vec<Marker>) {
        self.marker_updates += 1;
        self.markers = markers;
    }

    fn fly_to(&mut self, camera: Camera) {
        self.cameras.push(camera);
    }
}
