//! The single "mutate at path" primitive for publication documents.
//!
//! Every in-place change to a publication, its comments or their replies is
//! expressed as a [`Mutation`] applied at a [`NodePath`]. A path always names
//! the full chain of ancestors, so a reply is only ever matched inside the
//! comment named by the path, and that comment only inside the named
//! publication.

use pubsvc_core::{ObjectId, ServiceError};

use crate::model::{Comment, Publication, Reply};

/// Full ancestor key path to a node inside a publication document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePath {
    Publication(ObjectId),
    Comment(ObjectId, ObjectId),
    Reply(ObjectId, ObjectId, ObjectId),
}

impl NodePath {
    /// Id of the publication (the storage unit) the path lives in.
    pub fn publication_id(&self) -> ObjectId {
        match self {
            NodePath::Publication(p) | NodePath::Comment(p, _) | NodePath::Reply(p, _, _) => *p,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Mutation {
    /// Add `delta` to the node's like counter. Valid at every level.
    AdjustLikes(i64),
    /// Append a comment to the publication at the path.
    AppendComment(Comment),
    /// Append a reply to the comment at the path.
    AppendReply(Reply),
    /// Remove the comment or reply at the path (with its children).
    Remove,
    /// Point the publication's media reference at a blob.
    SetMedia(ObjectId),
}

/// Apply `mutation` at `path` inside `doc`.
///
/// Returns `Ok(true)` if the document changed and `Ok(false)` if some segment
/// of the path did not resolve (the document is then untouched). Appending a
/// child whose id already exists in its scope is a storage fault.
pub fn apply(doc: &mut Publication, path: &NodePath, mutation: &Mutation) -> Result<bool, ServiceError> {
    if doc.id != path.publication_id() {
        return Ok(false);
    }

    match (path, mutation) {
        (NodePath::Publication(_), Mutation::AdjustLikes(delta)) => {
            doc.likes_count = doc.likes_count.saturating_add(*delta);
            Ok(true)
        }
        (NodePath::Publication(_), Mutation::SetMedia(media)) => {
            doc.media = Some(*media);
            Ok(true)
        }
        (NodePath::Publication(_), Mutation::AppendComment(comment)) => {
            if doc.comments.iter().any(|c| c.id == comment.id) {
                return Err(ServiceError::Storage(format!(
                    "duplicate key: comment {} already exists in publication {}",
                    comment.id, doc.id
                )));
            }
            doc.comments.push(comment.clone());
            Ok(true)
        }

        (NodePath::Comment(_, comment_id), Mutation::AdjustLikes(delta)) => {
            Ok(match find_comment(doc, comment_id) {
                Some(comment) => {
                    comment.likes_count = comment.likes_count.saturating_add(*delta);
                    true
                }
                None => false,
            })
        }
        (NodePath::Comment(_, comment_id), Mutation::AppendReply(reply)) => {
            let publication_id = doc.id;
            let Some(comment) = find_comment(doc, comment_id) else {
                return Ok(false);
            };
            if comment.replies.iter().any(|r| r.id == reply.id) {
                return Err(ServiceError::Storage(format!(
                    "duplicate key: reply {} already exists in comment {}/{}",
                    reply.id, publication_id, comment_id
                )));
            }
            comment.replies.push(reply.clone());
            Ok(true)
        }
        (NodePath::Comment(_, comment_id), Mutation::Remove) => {
            Ok(match doc.comments.iter().position(|c| c.id == *comment_id) {
                Some(idx) => {
                    doc.comments.remove(idx);
                    true
                }
                None => false,
            })
        }

        (NodePath::Reply(_, comment_id, reply_id), Mutation::AdjustLikes(delta)) => {
            Ok(match find_reply(doc, comment_id, reply_id) {
                Some(reply) => {
                    reply.likes_count = reply.likes_count.saturating_add(*delta);
                    true
                }
                None => false,
            })
        }
        (NodePath::Reply(_, comment_id, reply_id), Mutation::Remove) => {
            let Some(comment) = find_comment(doc, comment_id) else {
                return Ok(false);
            };
            Ok(match comment.replies.iter().position(|r| r.id == *reply_id) {
                Some(idx) => {
                    comment.replies.remove(idx);
                    true
                }
                None => false,
            })
        }

        (path, mutation) => Err(ServiceError::Internal(format!(
            "mutation {mutation:?} is not applicable at {path:?}"
        ))),
    }
}

fn find_comment<'a>(doc: &'a mut Publication, comment_id: &ObjectId) -> Option<&'a mut Comment> {
    doc.comments.iter_mut().find(|c| c.id == *comment_id)
}

fn find_reply<'a>(
    doc: &'a mut Publication,
    comment_id: &ObjectId,
    reply_id: &ObjectId,
) -> Option<&'a mut Reply> {
    find_comment(doc, comment_id)?
        .replies
        .iter_mut()
        .find(|r| r.id == *reply_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_comment, build_publication, build_reply};
    use crate::model::{NewComment, NewPublication, NewReply};

    fn publication() -> Publication {
        build_publication(NewPublication {
            publication_name: "p".into(),
            user_name: "foo".into(),
            description: "desc".into(),
            content_type: None,
            category: None,
        })
    }

    fn comment(user: &str) -> Comment {
        build_comment(NewComment {
            user: user.into(),
            content: "c".into(),
        })
    }

    fn reply() -> Reply {
        build_reply(NewReply {
            user: "foo".into(),
            target_user: "bar".into(),
            content: "r".into(),
        })
    }

    #[test]
    fn adjusts_likes_at_each_level() {
        let mut doc = publication();
        let c = comment("bar");
        let r = reply();
        let (p_id, c_id, r_id) = (doc.id, c.id, r.id);
        apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(c)).unwrap();
        apply(&mut doc, &NodePath::Comment(p_id, c_id), &Mutation::AppendReply(r)).unwrap();

        assert!(apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AdjustLikes(1)).unwrap());
        assert!(apply(&mut doc, &NodePath::Comment(p_id, c_id), &Mutation::AdjustLikes(-1)).unwrap());
        assert!(apply(&mut doc, &NodePath::Reply(p_id, c_id, r_id), &Mutation::AdjustLikes(1)).unwrap());

        assert_eq!(doc.likes_count, 1);
        assert_eq!(doc.comments[0].likes_count, -1);
        assert_eq!(doc.comments[0].replies[0].likes_count, 1);
    }

    #[test]
    fn reply_is_only_matched_under_its_own_comment() {
        let mut doc = publication();
        let p_id = doc.id;
        let first = comment("a");
        let second = comment("b");
        let r = reply();
        let (first_id, second_id, r_id) = (first.id, second.id, r.id);
        apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(first)).unwrap();
        apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(second)).unwrap();
        apply(&mut doc, &NodePath::Comment(p_id, second_id), &Mutation::AppendReply(r)).unwrap();

        let before = doc.clone();
        let wrong = NodePath::Reply(p_id, first_id, r_id);
        assert!(!apply(&mut doc, &wrong, &Mutation::AdjustLikes(1)).unwrap());
        assert!(!apply(&mut doc, &wrong, &Mutation::Remove).unwrap());
        assert_eq!(doc, before);

        let right = NodePath::Reply(p_id, second_id, r_id);
        assert!(apply(&mut doc, &right, &Mutation::Remove).unwrap());
        assert!(doc.comments[1].replies.is_empty());
    }

    #[test]
    fn wrong_publication_is_a_miss() {
        let mut doc = publication();
        let other = ObjectId::new();
        assert!(!apply(&mut doc, &NodePath::Publication(other), &Mutation::AdjustLikes(1)).unwrap());
        assert_eq!(doc.likes_count, 0);
    }

    #[test]
    fn removing_comment_drops_its_replies_and_keeps_order() {
        let mut doc = publication();
        let p_id = doc.id;
        let comments: Vec<Comment> = ["a", "b", "c"].into_iter().map(comment).collect();
        let ids: Vec<ObjectId> = comments.iter().map(|c| c.id).collect();
        for c in comments {
            apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(c)).unwrap();
        }
        apply(&mut doc, &NodePath::Comment(p_id, ids[1]), &Mutation::AppendReply(reply())).unwrap();

        assert!(apply(&mut doc, &NodePath::Comment(p_id, ids[1]), &Mutation::Remove).unwrap());
        let left: Vec<ObjectId> = doc.comments.iter().map(|c| c.id).collect();
        assert_eq!(left, vec![ids[0], ids[2]]);

        // Removing again finds nothing.
        assert!(!apply(&mut doc, &NodePath::Comment(p_id, ids[1]), &Mutation::Remove).unwrap());
    }

    #[test]
    fn duplicate_child_ids_are_rejected() {
        let mut doc = publication();
        let p_id = doc.id;
        let c = comment("a");
        apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(c.clone())).unwrap();
        let err = apply(&mut doc, &NodePath::Publication(p_id), &Mutation::AppendComment(c)).unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(doc.comments.len(), 1);
    }

    #[test]
    fn reply_to_missing_comment_is_a_miss() {
        let mut doc = publication();
        let p_id = doc.id;
        let path = NodePath::Comment(p_id, ObjectId::new());
        assert!(!apply(&mut doc, &path, &Mutation::AppendReply(reply())).unwrap());
    }

    #[test]
    fn inapplicable_combinations_are_internal_errors() {
        let mut doc = publication();
        let p_id = doc.id;
        let err = apply(&mut doc, &NodePath::Publication(p_id), &Mutation::Remove).unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
