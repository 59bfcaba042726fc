use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pubsvc_core::{ObjectId, ServiceError};

// ---------------------------------------------------------------------------
// Enumerated tags
// ---------------------------------------------------------------------------

/// Kind of media a publication carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
    Gif,
    Tweet,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    PixelArt,
    DigitalDrawing,
    Photography,
}

// ---------------------------------------------------------------------------
// Stored documents
// ---------------------------------------------------------------------------

/// A top-level post. Comments and their replies are embedded, so one
/// publication is one storage unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_name: String,
    #[serde(default)]
    pub publication_name: String,
    pub publication_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    /// Blob id of the attached media; None until an upload completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Signed; downvotes are not floored at zero.
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: String,
    pub publication_date: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub likes_count: i64,
    /// A document written without this list reads back as empty.
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: String,
    /// The user being replied to.
    pub target_user: String,
    pub publication_date: DateTime<Utc>,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub likes_count: i64,
}

/// Users who liked a publication. Set semantics: a user appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub publication_id: ObjectId,
    #[serde(default)]
    pub users: BTreeSet<String>,
}

impl LikeRecord {
    pub fn new(publication_id: ObjectId) -> Self {
        Self {
            publication_id,
            users: BTreeSet::new(),
        }
    }
}

/// Metadata of an uploaded media blob. The bytes live in the blob store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMeta {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Uploading user.
    pub owner: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Body for `POST /publications`.
///
/// Id, timestamps, hashtags, media and counters are assigned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPublication {
    pub publication_name: String,
    pub user_name: String,
    pub description: String,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Body for `POST /publications/{id}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub user: String,
    pub content: String,
}

/// Body for `POST /publications/{id}/comments/{cid}/replies`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReply {
    pub user: String,
    pub target_user: String,
    pub content: String,
}

/// Body for `@like` / `@unlike`.
#[derive(Debug, Clone, Deserialize)]
pub struct LikeRequest {
    pub user: String,
}

/// Query for `GET /publications`.
///
/// `since` is RFC 3339. The query string decodes `+` as a space, so a
/// positive offset must be sent as `%2B02:00`; UTC can be written as `Z`.
/// An unencoded `+` is rejected with 400.
#[derive(Debug, Default, Deserialize)]
pub struct SinceQuery {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}

fn require(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("'{field}' must not be blank")));
    }
    Ok(())
}

impl NewPublication {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require("publication_name", &self.publication_name)?;
        require("user_name", &self.user_name)
    }
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require("user", &self.user)?;
        require("content", &self.content)
    }
}

impl NewReply {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require("user", &self.user)?;
        require("target_user", &self.target_user)?;
        require("content", &self.content)
    }
}

impl LikeRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require("user", &self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_use_wire_names() {
        let ct: ContentType = serde_json::from_str("\"gif\"").unwrap();
        assert_eq!(ct, ContentType::Gif);
        let cat: Category = serde_json::from_str("\"pixel-art\"").unwrap();
        assert_eq!(cat, Category::PixelArt);
        assert_eq!(
            serde_json::to_string(&Category::DigitalDrawing).unwrap(),
            "\"digital-drawing\""
        );
        assert!(serde_json::from_str::<Category>("\"oil-painting\"").is_err());
    }

    #[test]
    fn comment_without_replies_reads_as_empty() {
        let id = ObjectId::new();
        let raw = serde_json::json!({
            "_id": id,
            "user": "bar",
            "publication_date": "2000-12-31T23:59:59Z",
            "content": "comment example",
        });
        let comment: Comment = serde_json::from_value(raw).unwrap();
        assert!(comment.replies.is_empty());
        assert_eq!(comment.likes_count, 0);
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let req = NewReply {
            user: "foo".into(),
            target_user: "  ".into(),
            content: "hi".into(),
        };
        assert!(matches!(req.validate(), Err(ServiceError::Validation(_))));

        let req = NewPublication {
            publication_name: "sunset".into(),
            user_name: "foo".into(),
            description: String::new(),
            content_type: None,
            category: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn unknown_fields_in_requests_are_ignored() {
        let req: NewPublication = serde_json::from_value(serde_json::json!({
            "publication_name": "sunset",
            "user_name": "foo",
            "description": "#sky",
            "media_url": "https://image.com/img.png",
            "content_type": "image",
        }))
        .unwrap();
        assert_eq!(req.content_type, Some(ContentType::Image));
    }
}
