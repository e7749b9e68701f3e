//! Visit ledger records and the cross-view visit signal.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of a logged-in or guest user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

// The API hands out numeric ids; everything downstream treats them as text.
impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        let id = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text,
            Raw::Number(number) => number.to_string(),
        };
        UserId::new(id).ok_or_else(|| serde::de::Error::custom("user id is blank"))
    }
}

impl UserId {
    /// `None` for a blank id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a user's visit ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Place name as stored by the ledger
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl VisitRecord {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            created_at: None,
        }
    }
}

/// `GET visits` answers either `{visits: [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VisitsPayload {
    Wrapped { visits: Vec<VisitRecord> },
    Bare(Vec<VisitRecord>),
}

impl VisitsPayload {
    pub(crate) fn into_records(self) -> Vec<VisitRecord> {
        match self {
            Self::Wrapped { visits } => visits,
            Self::Bare(visits) => visits,
        }
    }
}

/// Body of `POST explore`.
#[derive(Debug, Serialize)]
pub(crate) struct MarkVisitRequest<'a> {
    pub user_id: &'a str,
    pub location: &'a str,
}

/// Broadcast after every confirmed visit toggle so sibling views can reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSignal {
    pub city: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_ids_are_rejected() {
        assert!(UserId::new("  ").is_none());
        assert_eq!(UserId::new(" 42 ").unwrap().as_str(), "42");
    }

    #[test]
    fn numeric_ids_deserialize_as_text() {
        let id: UserId = serde_json::from_str("12").unwrap();
        assert_eq!(id.as_str(), "12");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn visits_payload_accepts_both_shapes() {
        let wrapped: VisitsPayload =
            serde_json::from_str(r#"{"visits":[{"location":"Lisbon","user_id":1}]}"#).unwrap();
        let bare: VisitsPayload = serde_json::from_str(r#"[{"location":"Oslo"}]"#).unwrap();

        assert_eq!(wrapped.into_records(), vec![VisitRecord::new("Lisbon")]);
        assert_eq!(bare.into_records(), vec![VisitRecord::new("Oslo")]);
    }

    #[test]
    fn signal_uses_wire_field_names() {
        let signal = VisitSignal {
            city: "Lisbon".into(),
            user_id: UserId::new("7").unwrap(),
            at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["userId"], "7");
        assert_eq!(json["city"], "Lisbon");
    }
}
