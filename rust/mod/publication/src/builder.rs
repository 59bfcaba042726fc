//! Construction of new records from validated request bodies.
//!
//! Builders assign the fields a client never supplies: a fresh id, the
//! creation time, zeroed counters, empty child lists and derived hashtags.
//! They perform no I/O.

use chrono::Utc;

use pubsvc_core::ObjectId;

use crate::hashtag;
use crate::model::{Comment, NewComment, NewPublication, NewReply, Publication, Reply};

pub fn build_publication(fields: NewPublication) -> Publication {
    Publication {
        id: ObjectId::new(),
        hashtags: hashtag::extract(&fields.description),
        user_name: fields.user_name,
        publication_name: fields.publication_name,
        publication_date: Utc::now(),
        content_type: fields.content_type,
        media: None,
        category: fields.category,
        description: fields.description,
        likes_count: 0,
        comments: Vec::new(),
    }
}

pub fn build_comment(fields: NewComment) -> Comment {
    Comment {
        id: ObjectId::new(),
        hashtags: hashtag::extract(&fields.content),
        user: fields.user,
        publication_date: Utc::now(),
        content: fields.content,
        likes_count: 0,
        replies: Vec::new(),
    }
}

pub fn build_reply(fields: NewReply) -> Reply {
    Reply {
        id: ObjectId::new(),
        hashtags: hashtag::extract(&fields.content),
        user: fields.user,
        target_user: fields.target_user,
        publication_date: Utc::now(),
        content: fields.content,
        likes_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ContentType};

    #[test]
    fn publication_starts_empty() {
        let before = Utc::now();
        let publication = build_publication(NewPublication {
            publication_name: "sunset".into(),
            user_name: "foo".into(),
            description: "golden hour #sky #Photo".into(),
            content_type: Some(ContentType::Image),
            category: Some(Category::Photography),
        });

        assert!(publication.comments.is_empty());
        assert_eq!(publication.likes_count, 0);
        assert_eq!(publication.media, None);
        assert_eq!(publication.hashtags, vec!["sky", "Photo"]);
        assert_eq!(publication.user_name, "foo");
        assert_eq!(publication.content_type, Some(ContentType::Image));
        assert!(publication.publication_date >= before);
    }

    #[test]
    fn comment_and_reply_derive_hashtags_from_content() {
        let comment = build_comment(NewComment {
            user: "bar".into(),
            content: "love it #wow".into(),
        });
        assert_eq!(comment.hashtags, vec!["wow"]);
        assert!(comment.replies.is_empty());
        assert_eq!(comment.likes_count, 0);

        let reply = build_reply(NewReply {
            user: "foo".into(),
            target_user: "bar".into(),
            content: "thanks".into(),
        });
        assert!(reply.hashtags.is_empty());
        assert_eq!(reply.target_user, "bar");
        assert_ne!(reply.id, comment.id);
    }
}
