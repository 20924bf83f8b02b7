//! Guestbook models.
//!
//! Visitors leave messages that stay hidden until an administrator approves
//! them. Private messages are only ever visible to administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::user::looks_like_email};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 2000;

/// Represents a row of the `guestbook_entries` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GuestbookEntry {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub comment: String,
    pub message_type: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Public view of an entry; the author's e-mail is withheld.
#[derive(Debug, Serialize)]
pub struct PublicGuestbookEntry {
    pub id: i32,
    pub name: String,
    pub comment: String,
    pub message_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<GuestbookEntry> for PublicGuestbookEntry {
    fn from(entry: GuestbookEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            comment: entry.comment,
            message_type: entry.message_type,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Public,
    Private,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Public => "public",
            MessageType::Private => "private",
        }
    }
}

/// Request body for `POST /api/guestbook/create`.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Ben",
///   "email": "ben@example.com",
///   "comment": "Great site!",
///   "message_type": "public"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub comment: String,
    #[serde(default)]
    pub message_type: MessageType,
}

impl CreateEntryRequest {
    /// Trim fields and check lengths. Returns the cleaned request.
    pub fn sanitized(self) -> Result<Self, AppError> {
        let name = self.name.trim().to_string();
        let comment = self.comment.trim().to_string();
        let email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Name must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }
        if comment.is_empty() || comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::InvalidRequest(format!(
                "Comment must be between 1 and {MAX_COMMENT_LEN} characters"
            )));
        }
        if let Some(ref email) = email {
            if !looks_like_email(email) {
                return Err(AppError::InvalidRequest("Invalid email address".to_string()));
            }
        }

        Ok(Self {
            name,
            email,
            comment,
            message_type: self.message_type,
        })
    }
}

/// Body of `PUT /api/admin/guestbook/approve/{id}`.
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateEntryResponse {
    pub success: bool,
    pub message: String,
    pub entry: GuestbookEntry,
}

#[derive(Debug, Serialize)]
pub struct AdminEntriesResponse {
    pub success: bool,
    pub entries: Vec<GuestbookEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, comment: &str, email: Option<&str>) -> CreateEntryRequest {
        CreateEntryRequest {
            name: name.to_string(),
            email: email.map(str::to_string),
            comment: comment.to_string(),
            message_type: MessageType::Public,
        }
    }

    #[test]
    fn test_sanitized_trims_and_drops_blank_email() {
        let clean = request("  Ben  ", " Hello! ", Some("   ")).sanitized().unwrap();
        assert_eq!(clean.name, "Ben");
        assert_eq!(clean.comment, "Hello!");
        assert!(clean.email.is_none());
    }

    #[test]
    fn test_sanitized_rejects_bad_input() {
        assert!(request("", "hi", None).sanitized().is_err());
        assert!(request("Ben", "   ", None).sanitized().is_err());
        assert!(request("Ben", "hi", Some("not-an-email")).sanitized().is_err());
        let long = "x".repeat(MAX_COMMENT_LEN + 1);
        assert!(request("Ben", &long, None).sanitized().is_err());
        let long_name = "n".repeat(MAX_NAME_LEN + 1);
        assert!(request(&long_name, "hi", None).sanitized().is_err());
    }

    #[test]
    fn test_message_type_defaults_to_public() {
        let parsed: CreateEntryRequest =
            serde_json::from_str(r#"{"name":"Ben","comment":"hi"}"#).unwrap();
        assert_eq!(parsed.message_type, MessageType::Public);

        let parsed: CreateEntryRequest =
            serde_json::from_str(r#"{"name":"Ben","comment":"hi","message_type":"private"}"#)
                .unwrap();
        assert_eq!(parsed.message_type.as_str(), "private");
    }
}
