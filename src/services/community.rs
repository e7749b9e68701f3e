// src/services/community.rs

//! Login, profile, reviews and leaderboard.
//!
//! Plain request wrappers; the views that use them keep their own state.

use std::sync::Arc;

use reqwest::Method;

use crate::error::{AppError, Result};
use crate::models::{
    DeleteUserRequest, LeaderboardEntry, LeaderboardPayload, LoginRequest, Profile,
    ProfileUpdateRequest, Review, ReviewDraft, ReviewPayload, ReviewRequest, ReviewsPayload,
    Session, UserId,
};
use crate::services::ApiClient;
use crate::services::ledger::require_place;

/// Client for the community endpoints.
pub struct CommunityClient {
    api: Arc<ApiClient>,
}

impl CommunityClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Start a session. `None` (or a blank name) starts a guest session.
    pub async fn login(&self, username: Option<&str>) -> Result<Session> {
        let request = LoginRequest {
            username: username.map(str::trim).filter(|u| !u.is_empty()),
        };
        let session: Session = self
            .api
            .send_json(Method::POST, "user/login", &request, "Login failed")
            .await?;
        log::info!("Signed in as {} ({})", session.username, session.id);
        Ok(session)
    }

    /// Save profile edits. Fields the server does not echo keep the sent value.
    pub async fn update_profile(
        &self,
        user: Option<&UserId>,
        profile: &Profile,
    ) -> Result<Profile> {
        let user = user.ok_or(AppError::IdentityRequired)?;
        profile.validate()?;

        let request = ProfileUpdateRequest {
            user_id: user.as_str(),
            username: profile.username.trim(),
            email: profile.email.trim(),
            bio: &profile.bio,
            profile_pic: profile.profile_pic.trim(),
        };
        let echoed: Option<Profile> = self
            .api
            .send_json(Method::PUT, "user/update", &request, "Update failed")
            .await?;
        log::info!("Updated profile of user {}", user);
        Ok(echoed.unwrap_or_default().merged(profile))
    }

    /// Delete the account. The session is unusable afterwards.
    pub async fn delete_user(&self, user: Option<&UserId>) -> Result<()> {
        let user = user.ok_or(AppError::IdentityRequired)?;
        let request = DeleteUserRequest {
            user_id: user.as_str(),
        };
        let _: serde_json::Value = self
            .api
            .send_json(Method::DELETE, "user/delete", &request, "Delete failed")
            .await?;
        log::info!("Deleted user {}", user);
        Ok(())
    }

    /// Ranked travelers, best first.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let payload: LeaderboardPayload = self
            .api
            .get_json("leaderboard", &[], "Failed to load leaderboard")
            .await?;
        Ok(payload.users)
    }

    /// Reviews left for `place`.
    pub async fn reviews(&self, place: &str) -> Result<Vec<Review>> {
        let place = require_place(place)?;
        let payload: ReviewsPayload = self
            .api
            .get_json("reviews", &[("location", place)], "Failed to load reviews")
            .await?;
        Ok(payload.reviews)
    }

    /// Publish `draft` for `place`.
    ///
    /// The draft is only borrowed; on failure the caller still holds it.
    pub async fn submit_review(
        &self,
        user: Option<&UserId>,
        place: &str,
        draft: &ReviewDraft,
    ) -> Result<Option<Review>> {
        let user = user.ok_or(AppError::IdentityRequired)?;
        let place = require_place(place)?;
        draft.validate()?;

        let request = ReviewRequest {
            user_id: user.as_str(),
            location: place,
            rating: draft.rating,
            comment: draft.comment.trim(),
        };
        let payload: ReviewPayload = self
            .api
            .send_json(Method::POST, "reviews", &request, "Failed to submit review")
            .await?;
        Ok(payload.review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiConfig;

    fn client() -> CommunityClient {
        // Port 9 (discard) is never contacted: every case fails validation first.
        let api = ApiClient::new(&ApiConfig {
            base_url: "http://127.0.0.1:9/".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        CommunityClient::new(Arc::new(api))
    }

    #[tokio::test]
    async fn submit_requires_identity() {
        let draft = ReviewDraft {
            rating: 5,
            comment: "Lovely".into(),
        };
        let err = client().submit_review(None, "Lisbon", &draft).await.unwrap_err();
        assert!(matches!(err, AppError::IdentityRequired));
    }

    #[tokio::test]
    async fn submit_rejects_empty_comment_and_keeps_draft() {
        let user = UserId::new("1").unwrap();
        let draft = ReviewDraft {
            rating: 3,
            comment: "   ".into(),
        };
        let err = client()
            .submit_review(Some(&user), "Lisbon", &draft)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(draft.rating, 3);
    }

    #[tokio::test]
    async fn profile_calls_require_identity() {
        let profile = Profile {
            username: "ana".into(),
            ..Profile::default()
        };
        let err = client().update_profile(None, &profile).await.unwrap_err();
        assert!(matches!(err, AppError::IdentityRequired));

        let err = client().delete_user(None).await.unwrap_err();
        assert!(matches!(err, AppError::IdentityRequired));
    }

    #[tokio::test]
    async fn update_rejects_blank_username() {
        let user = UserId::new("1").unwrap();
        let err = client()
            .update_profile(Some(&user), &Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn reviews_require_place() {
        let err = client().reviews("").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
