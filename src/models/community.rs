//! Session, review and leaderboard shapes exchanged with the community API.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::UserId;

/// The signed-in (or guest) user the explorer acts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: UserId,
    pub username: String,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub points: u32,
}

fn first_level() -> u32 {
    1
}

/// Body of `POST user/login`; an empty body starts a guest session.
#[derive(Debug, Default, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

/// A published review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub user: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A review the user is composing. Kept by the caller across failed submits.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            rating: 5,
            comment: String::new(),
        }
    }
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        if self.comment.trim().is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        Ok(())
    }
}

/// Body of `POST reviews`.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewRequest<'a> {
    pub user_id: &'a str,
    pub location: &'a str,
    pub rating: u8,
    pub comment: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsPayload {
    #[serde(default)]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewPayload {
    pub review: Option<Review>,
}

/// Profile fields the user can edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, rename = "profilePic")]
    pub profile_pic: String,
}

impl Profile {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation("Username cannot be empty"));
        }
        Ok(())
    }

    /// Fields the server echoed back, falling back to what was sent.
    pub(crate) fn merged(self, sent: &Profile) -> Profile {
        let pick = |echoed: String, sent: &str| {
            if echoed.is_empty() {
                sent.to_string()
            } else {
                echoed
            }
        };
        Profile {
            username: pick(self.username, &sent.username),
            email: pick(self.email, &sent.email),
            bio: pick(self.bio, &sent.bio),
            profile_pic: pick(self.profile_pic, &sent.profile_pic),
        }
    }
}

/// Body of `PUT user/update`.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdateRequest<'a> {
    pub user_id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub bio: &'a str,
    #[serde(rename = "profilePic")]
    pub profile_pic: &'a str,
}

/// Body of `DELETE user/delete`.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteUserRequest<'a> {
    pub user_id: &'a str,
}

/// One ranked traveler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(default)]
    pub points: u32,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub visits: Option<u32>,
    #[serde(default, rename = "avgRating")]
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaderboardPayload {
    #[serde(default)]
    pub users: Vec<LeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_validation() {
        assert!(ReviewDraft::default().validate().is_err());

        let draft = ReviewDraft {
            rating: 4,
            comment: "Great food".into(),
        };
        assert!(draft.validate().is_ok());

        let zero = ReviewDraft {
            rating: 0,
            ..draft.clone()
        };
        assert!(matches!(zero.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn guest_login_sends_empty_body() {
        let body = serde_json::to_string(&LoginRequest::default()).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn profile_update_body_shape() {
        let body = serde_json::to_value(ProfileUpdateRequest {
            user_id: "4",
            username: "ana",
            email: "ana@example.com",
            bio: "",
            profile_pic: "https://example.com/a.png",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "user_id": "4",
                "username": "ana",
                "email": "ana@example.com",
                "bio": "",
                "profilePic": "https://example.com/a.png"
            })
        );

        let body = serde_json::to_string(&DeleteUserRequest { user_id: "4" }).unwrap();
        assert_eq!(body, r#"{"user_id":"4"}"#);
    }

    #[test]
    fn profile_echo_falls_back_to_sent_fields() {
        let sent = Profile {
            username: "ana".into(),
            email: "ana@example.com".into(),
            bio: "Walker".into(),
            profile_pic: String::new(),
        };
        let echoed: Profile =
            serde_json::from_str(r#"{"username":"Ana","profilePic":"p.png"}"#).unwrap();
        let merged = echoed.merged(&sent);

        assert_eq!(merged.username, "Ana");
        assert_eq!(merged.email, "ana@example.com");
        assert_eq!(merged.bio, "Walker");
        assert_eq!(merged.profile_pic, "p.png");

        let blank = Profile::default();
        assert!(matches!(blank.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn leaderboard_optional_columns() {
        let payload: LeaderboardPayload = serde_json::from_str(
            r#"{"users":[{"username":"ana","points":500,"level":3,"avgRating":4.5},
                         {"username":"bo","points":25,"level":1,"visits":1}]}"#,
        )
        .unwrap();
        assert_eq!(payload.users[0].avg_rating, Some(4.5));
        assert_eq!(payload.users[0].visits, None);
        assert_eq!(payload.users[1].visits, Some(1));
    }
}
