//! Response normalisation.
//!
//! Stored documents carry binary ids; everything that leaves the API is
//! converted here so every `_id` at every depth is its 24-character hex text.

use serde::Serialize;

use crate::MODULE_NAME;
use crate::model::{Category, Comment, ContentType, Publication, Reply};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_name: String,
    pub publication_name: String,
    pub publication_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub description: String,
    pub hashtags: Vec<String>,
    pub likes_count: i64,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub publication_date: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub likes_count: i64,
    pub replies: Vec<ReplyView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub target_user: String,
    pub publication_date: String,
    pub content: String,
    pub hashtags: Vec<String>,
    pub likes_count: i64,
}

impl From<Publication> for PublicationView {
    fn from(p: Publication) -> Self {
        Self {
            id: p.id.to_hex(),
            user_name: p.user_name,
            publication_name: p.publication_name,
            publication_date: p.publication_date.to_rfc3339(),
            content_type: p.content_type,
            media_url: p.media.map(|m| format!("/{MODULE_NAME}/images/{m}")),
            category: p.category,
            description: p.description,
            hashtags: p.hashtags,
            likes_count: p.likes_count,
            comments: p.comments.into_iter().map(CommentView::from).collect(),
        }
    }
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.to_hex(),
            user: c.user,
            publication_date: c.publication_date.to_rfc3339(),
            content: c.content,
            hashtags: c.hashtags,
            likes_count: c.likes_count,
            replies: c.replies.into_iter().map(ReplyView::from).collect(),
        }
    }
}

impl From<Reply> for ReplyView {
    fn from(r: Reply) -> Self {
        Self {
            id: r.id.to_hex(),
            user: r.user,
            target_user: r.target_user,
            publication_date: r.publication_date.to_rfc3339(),
            content: r.content,
            hashtags: r.hashtags,
            likes_count: r.likes_count,
        }
    }
}

/// Normalise a list of publications, keeping order.
pub fn normalize_all(publications: Vec<Publication>) -> Vec<PublicationView> {
    publications.into_iter().map(PublicationView::from).collect()
}
