// src/models/mod.rs

//! Domain models for the explorer.
//!
//! This module contains the data structures shared by the engine, the
//! services and the map adapter, organized by their primary purpose.

mod community;
mod config;
mod place;
mod visit;

// Re-export all public types
pub use community::{LeaderboardEntry, Profile, Review, ReviewDraft, Session};
pub(crate) use community::{
    DeleteUserRequest, LeaderboardPayload, LoginRequest, ProfileUpdateRequest, ReviewPayload,
    ReviewRequest, ReviewsPayload,
};
pub use config::{ApiConfig, Config, LoggingConfig, MapConfig, NotifyConfig, Settings};
pub use place::{LatLon, Place, PlaceKey, RawPlace};
pub use visit::{UserId, VisitRecord, VisitSignal};
pub(crate) use visit::{MarkVisitRequest, VisitsPayload};
