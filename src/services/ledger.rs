// src/services/ledger.rs

//! Visit ledger client.
//!
//! Reads a user's visit rows and submits visit toggles. Stateless: the
//! engine decides when to call and what to do with the answer.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{MarkVisitRequest, UserId, VisitRecord, VisitsPayload};
use crate::services::ApiClient;

/// The authoritative record of which places a user has visited.
#[async_trait]
pub trait VisitLedger: Send + Sync {
    /// All visit rows for `user`, oldest first.
    async fn fetch_visits(&self, user: &UserId) -> Result<Vec<VisitRecord>>;

    /// Toggle `place` in the user's ledger. Resolves only once the ledger has
    /// accepted the write.
    async fn mark_visit(&self, user: &UserId, place: &str) -> Result<()>;
}

/// Ledger served by the remote API.
pub struct HttpLedger {
    api: Arc<ApiClient>,
}

impl HttpLedger {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl VisitLedger for HttpLedger {
    async fn fetch_visits(&self, user: &UserId) -> Result<Vec<VisitRecord>> {
        let payload: VisitsPayload = self
            .api
            .get_json("visits", &[("user_id", user.as_str())], "Failed to load visits")
            .await?;
        Ok(payload.into_records())
    }

    async fn mark_visit(&self, user: &UserId, place: &str) -> Result<()> {
        let place = require_place(place)?;
        let request = MarkVisitRequest {
            user_id: user.as_str(),
            location: place,
        };
        let _ack: Value = self
            .api
            .send_json(Method::POST, "explore", &request, "Unable to mark visited")
            .await?;
        log::debug!("Ledger accepted toggle of {} for user {}", place, user);
        Ok(())
    }
}

/// Reject a blank place name before anything goes over the wire.
pub(crate) fn require_place(place: &str) -> Result<&str> {
    let place = place.trim();
    if place.is_empty() {
        return Err(AppError::validation("A place name is required"));
    }
    Ok(place)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_place_is_a_validation_error() {
        assert!(matches!(require_place("   "), Err(AppError::Validation(_))));
        assert_eq!(require_place(" Lisbon ").unwrap(), "Lisbon");
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(MarkVisitRequest {
            user_id: "3",
            location: "Lisbon",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"user_id": "3", "location": "Lisbon"}));
    }
}
