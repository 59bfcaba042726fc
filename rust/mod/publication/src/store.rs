use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use pubsvc_blob::BlobStore;
use pubsvc_core::{ObjectId, ServiceError};
use pubsvc_kv::{KVError, KVStore, KVTxn};

use crate::model::{Comment, LikeRecord, MediaMeta, Publication, Reply};
use crate::mutation::{self, Mutation, NodePath};

const PUBLICATION_PREFIX: &str = "publication:";
const LIKES_PREFIX: &str = "likes:";
const MEDIA_PREFIX: &str = "media:";

fn publication_key(id: &ObjectId) -> String {
    format!("{PUBLICATION_PREFIX}{id}")
}

fn likes_key(id: &ObjectId) -> String {
    format!("{LIKES_PREFIX}{id}")
}

fn media_key(id: &ObjectId) -> String {
    format!("{MEDIA_PREFIX}{id}")
}

/// Blob store key holding the bytes of a media upload.
pub fn media_blob_key(id: &ObjectId) -> String {
    format!("images/{id}")
}

/// Document storage for publications, like records and media metadata.
///
/// KV layout:
///
/// ```text
/// publication:{id}  → Publication (comments and replies embedded)
/// likes:{id}        → LikeRecord
/// media:{id}        → MediaMeta
/// ```
///
/// Media bytes live in the blob store under [`media_blob_key`].
///
/// Each publication is one KV value, and every write to it is a
/// read-modify-write inside a single KV transaction, so concurrent updates to
/// the same publication are serialised. A publication and its like record are
/// removed in the same transaction. The blob store is a separate system:
/// media cleanup after a delete is best effort, and a failure leaves an
/// orphaned blob (logged at `warn`) while the delete itself stands.
pub struct PublicationStore {
    kv: Arc<dyn KVStore>,
    blob: Arc<dyn BlobStore>,
}

impl PublicationStore {
    pub fn new(kv: Arc<dyn KVStore>, blob: Arc<dyn BlobStore>) -> Self {
        Self { kv, blob }
    }

    // -----------------------------------------------------------------------
    // Publications
    // -----------------------------------------------------------------------

    /// Store a new publication together with its empty like record.
    pub fn insert_publication(&self, publication: &Publication) -> Result<ObjectId, ServiceError> {
        let id = publication.id;
        let key = publication_key(&id);
        let doc = encode(publication).map_err(storage)?;
        let likes = encode(&LikeRecord::new(id)).map_err(storage)?;

        let mut duplicate = false;
        self.kv
            .transaction(&mut |txn| {
                duplicate = txn.get(&key)?.is_some();
                if duplicate {
                    return Ok(());
                }
                txn.set(&key, &doc)?;
                txn.set(&likes_key(&id), &likes)
            })
            .map_err(storage)?;

        if duplicate {
            return Err(ServiceError::Storage(format!(
                "duplicate key: publication {id} already exists"
            )));
        }
        info!("Publication {} inserted", id);
        Ok(id)
    }

    pub fn get_publication(&self, id: &ObjectId) -> Result<Option<Publication>, ServiceError> {
        let raw = self.kv.get(&publication_key(id)).map_err(storage)?;
        let publication = raw
            .map(|raw| decode::<Publication>(&raw))
            .transpose()
            .map_err(storage)?;
        if publication.is_some() {
            debug!("Publication {} returned", id);
        }
        Ok(publication)
    }

    pub fn get_publications_by_user(&self, user_name: &str) -> Result<Vec<Publication>, ServiceError> {
        let publications = self.scan_publications(|p| p.user_name == user_name)?;
        debug!("{} publications returned for {}", publications.len(), user_name);
        Ok(publications)
    }

    /// Publications created at or after `since`.
    pub fn get_publications_since(&self, since: DateTime<Utc>) -> Result<Vec<Publication>, ServiceError> {
        let publications = self.scan_publications(|p| p.publication_date >= since)?;
        debug!("{} publications created since {} returned", publications.len(), since);
        Ok(publications)
    }

    /// Remove a publication and its like record, then release its media.
    ///
    /// Returns the removed document, children included.
    pub fn delete_publication(&self, id: &ObjectId) -> Result<Option<Publication>, ServiceError> {
        let key = publication_key(id);
        let mut removed: Option<Publication> = None;
        self.kv
            .transaction(&mut |txn| {
                removed = None;
                let Some(raw) = txn.get(&key)? else {
                    return Ok(());
                };
                let doc: Publication = decode(&raw)?;
                txn.delete(&key)?;
                txn.delete(&likes_key(id))?;
                removed = Some(doc);
                Ok(())
            })
            .map_err(storage)?;

        if let Some(doc) = &removed {
            info!("Publication {} removed", id);
            if let Some(media_id) = &doc.media {
                self.release_media(id, media_id);
            }
        }
        Ok(removed)
    }

    /// Remove every publication of `user_name`. Returns how many were removed.
    pub fn delete_publications_of_user(&self, user_name: &str) -> Result<usize, ServiceError> {
        let mut removed: Vec<Publication> = Vec::new();
        self.kv
            .transaction(&mut |txn| {
                removed.clear();
                for (key, raw) in txn.scan(PUBLICATION_PREFIX)? {
                    let doc: Publication = decode(&raw)?;
                    if doc.user_name != user_name {
                        continue;
                    }
                    txn.delete(&key)?;
                    txn.delete(&likes_key(&doc.id))?;
                    removed.push(doc);
                }
                Ok(())
            })
            .map_err(storage)?;

        for doc in &removed {
            if let Some(media_id) = &doc.media {
                self.release_media(&doc.id, media_id);
            }
        }
        info!("{} publications of {} removed", removed.len(), user_name);
        Ok(removed.len())
    }

    // -----------------------------------------------------------------------
    // Nested mutations
    // -----------------------------------------------------------------------

    /// Apply `mutation` at `path` atomically.
    ///
    /// Returns false if the publication or any node on the path is missing;
    /// nothing is written in that case.
    pub fn mutate(&self, path: &NodePath, mutation: &Mutation) -> Result<bool, ServiceError> {
        let key = publication_key(&path.publication_id());
        let mut outcome: Result<bool, ServiceError> = Ok(false);
        self.kv
            .transaction(&mut |txn| {
                outcome = Ok(false);
                let Some(raw) = txn.get(&key)? else {
                    return Ok(());
                };
                let mut doc: Publication = decode(&raw)?;
                match mutation::apply(&mut doc, path, mutation) {
                    Ok(true) => {
                        txn.set(&key, &encode(&doc)?)?;
                        outcome = Ok(true);
                    }
                    other => outcome = other,
                }
                Ok(())
            })
            .map_err(storage)?;
        outcome
    }

    /// Append a comment. None if the publication does not exist.
    pub fn insert_comment(
        &self,
        publication_id: &ObjectId,
        comment: Comment,
    ) -> Result<Option<ObjectId>, ServiceError> {
        let comment_id = comment.id;
        let user = comment.user.clone();
        let path = NodePath::Publication(*publication_id);
        if !self.mutate(&path, &Mutation::AppendComment(comment))? {
            return Ok(None);
        }
        info!("Comment {} by {} inserted in publication {}", comment_id, user, publication_id);
        Ok(Some(comment_id))
    }

    /// Append a reply. None if the (publication, comment) pair does not resolve.
    pub fn insert_reply(
        &self,
        publication_id: &ObjectId,
        comment_id: &ObjectId,
        reply: Reply,
    ) -> Result<Option<ObjectId>, ServiceError> {
        let reply_id = reply.id;
        let user = reply.user.clone();
        let path = NodePath::Comment(*publication_id, *comment_id);
        if !self.mutate(&path, &Mutation::AppendReply(reply))? {
            return Ok(None);
        }
        info!("Reply {} by {} inserted in comment {}", reply_id, user, comment_id);
        Ok(Some(reply_id))
    }

    pub fn delete_comment(&self, publication_id: &ObjectId, comment_id: &ObjectId) -> Result<bool, ServiceError> {
        self.mutate(&NodePath::Comment(*publication_id, *comment_id), &Mutation::Remove)
    }

    pub fn delete_reply(
        &self,
        publication_id: &ObjectId,
        comment_id: &ObjectId,
        reply_id: &ObjectId,
    ) -> Result<bool, ServiceError> {
        self.mutate(
            &NodePath::Reply(*publication_id, *comment_id, *reply_id),
            &Mutation::Remove,
        )
    }

    pub fn adjust_publication_likes(&self, publication_id: &ObjectId, delta: i64) -> Result<bool, ServiceError> {
        self.mutate(&NodePath::Publication(*publication_id), &Mutation::AdjustLikes(delta))
    }

    pub fn adjust_comment_likes(
        &self,
        publication_id: &ObjectId,
        comment_id: &ObjectId,
        delta: i64,
    ) -> Result<bool, ServiceError> {
        self.mutate(
            &NodePath::Comment(*publication_id, *comment_id),
            &Mutation::AdjustLikes(delta),
        )
    }

    pub fn adjust_reply_likes(
        &self,
        publication_id: &ObjectId,
        comment_id: &ObjectId,
        reply_id: &ObjectId,
        delta: i64,
    ) -> Result<bool, ServiceError> {
        self.mutate(
            &NodePath::Reply(*publication_id, *comment_id, *reply_id),
            &Mutation::AdjustLikes(delta),
        )
    }

    /// Point the publication's media reference at `media_id`.
    ///
    /// Media it replaces is released after the commit, best effort.
    pub fn attach_media(&self, publication_id: &ObjectId, media_id: &ObjectId) -> Result<bool, ServiceError> {
        let key = publication_key(publication_id);
        let path = NodePath::Publication(*publication_id);
        let mutation = Mutation::SetMedia(*media_id);
        let mut outcome: Result<bool, ServiceError> = Ok(false);
        let mut replaced: Option<ObjectId> = None;
        self.kv
            .transaction(&mut |txn| {
                outcome = Ok(false);
                replaced = None;
                let Some(raw) = txn.get(&key)? else {
                    return Ok(());
                };
                let mut doc: Publication = decode(&raw)?;
                let previous = doc.media;
                match mutation::apply(&mut doc, &path, &mutation) {
                    Ok(true) => {
                        txn.set(&key, &encode(&doc)?)?;
                        replaced = previous.filter(|old| old != media_id);
                        outcome = Ok(true);
                    }
                    other => outcome = other,
                }
                Ok(())
            })
            .map_err(storage)?;

        if let Some(old) = replaced {
            info!("Media {} of publication {} replaced by {}", old, publication_id, media_id);
            self.release_media(publication_id, &old);
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Like records
    // -----------------------------------------------------------------------

    /// Add `user` to the publication's like record.
    ///
    /// Returns whether the set changed. Missing publications are ignored.
    pub fn record_like(&self, publication_id: &ObjectId, user: &str) -> Result<bool, ServiceError> {
        self.update_like_record(publication_id, |record| record.users.insert(user.to_string()))
    }

    /// Remove `user` from the publication's like record. Returns whether the set changed.
    pub fn remove_like(&self, publication_id: &ObjectId, user: &str) -> Result<bool, ServiceError> {
        self.update_like_record(publication_id, |record| record.users.remove(user))
    }

    pub fn is_liked(&self, publication_id: &ObjectId, user: &str) -> Result<bool, ServiceError> {
        let raw = self.kv.get(&likes_key(publication_id)).map_err(storage)?;
        match raw {
            Some(raw) => {
                let record: LikeRecord = decode(&raw).map_err(storage)?;
                Ok(record.users.contains(user))
            }
            None => Ok(false),
        }
    }

    /// Set whether `user` likes the publication, keeping the counter and the
    /// like record in step within one transaction.
    ///
    /// Returns None if the publication does not exist, otherwise whether
    /// anything changed (liking twice changes nothing).
    pub fn set_liked(
        &self,
        publication_id: &ObjectId,
        user: &str,
        liked: bool,
    ) -> Result<Option<bool>, ServiceError> {
        let key = publication_key(publication_id);
        let lkey = likes_key(publication_id);
        let mut outcome: Option<bool> = None;
        self.kv
            .transaction(&mut |txn| {
                outcome = None;
                let Some(raw) = txn.get(&key)? else {
                    return Ok(());
                };
                let mut doc: Publication = decode(&raw)?;
                let mut record = load_like_record(txn, &lkey, publication_id)?;
                let changed = if liked {
                    record.users.insert(user.to_string())
                } else {
                    record.users.remove(user)
                };
                if changed {
                    doc.likes_count = doc.likes_count.saturating_add(if liked { 1 } else { -1 });
                    txn.set(&key, &encode(&doc)?)?;
                    txn.set(&lkey, &encode(&record)?)?;
                }
                outcome = Some(changed);
                Ok(())
            })
            .map_err(storage)?;

        if outcome == Some(true) {
            info!(
                "Publication {} {} by {}",
                publication_id,
                if liked { "liked" } else { "unliked" },
                user
            );
        }
        Ok(outcome)
    }

    /// Publications whose like record contains `user`.
    pub fn get_liked_publications(&self, user: &str) -> Result<Vec<Publication>, ServiceError> {
        let records = self.kv.scan(LIKES_PREFIX).map_err(storage)?;
        let mut publications = Vec::new();
        for (_, raw) in records {
            let record: LikeRecord = decode(&raw).map_err(storage)?;
            if !record.users.contains(user) {
                continue;
            }
            match self.get_publication(&record.publication_id)? {
                Some(publication) => publications.push(publication),
                None => warn!(
                    "like record for missing publication {}",
                    record.publication_id
                ),
            }
        }
        debug!("{} liked publications returned for {}", publications.len(), user);
        Ok(publications)
    }

    fn update_like_record(
        &self,
        publication_id: &ObjectId,
        mut change: impl FnMut(&mut LikeRecord) -> bool,
    ) -> Result<bool, ServiceError> {
        let key = publication_key(publication_id);
        let lkey = likes_key(publication_id);
        let mut changed = false;
        self.kv
            .transaction(&mut |txn| {
                changed = false;
                if txn.get(&key)?.is_none() {
                    return Ok(());
                }
                let mut record = load_like_record(txn, &lkey, publication_id)?;
                changed = change(&mut record);
                if changed {
                    txn.set(&lkey, &encode(&record)?)?;
                }
                Ok(())
            })
            .map_err(storage)?;
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    /// Store media bytes in the blob store and their metadata in KV.
    pub fn put_media(&self, meta: &MediaMeta, data: &[u8]) -> Result<(), ServiceError> {
        self.blob
            .put(&media_blob_key(&meta.id), data)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let raw = encode(meta).map_err(storage)?;
        self.kv.set(&media_key(&meta.id), &raw).map_err(storage)?;
        info!("Media {} uploaded by {} ({} bytes)", meta.id, meta.owner, meta.size);
        Ok(())
    }

    /// Media metadata and bytes. None if either half is missing.
    pub fn get_media(&self, id: &ObjectId) -> Result<Option<(MediaMeta, Vec<u8>)>, ServiceError> {
        let Some(raw) = self.kv.get(&media_key(id)).map_err(storage)? else {
            return Ok(None);
        };
        let meta: MediaMeta = decode(&raw).map_err(storage)?;
        let data = self
            .blob
            .get(&media_blob_key(id))
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        debug!("Media {} downloaded", id);
        Ok(data.map(|data| (meta, data)))
    }

    /// Best-effort removal of media no longer referenced by `publication_id`.
    ///
    /// Metadata is only dropped once the blob is gone, so an orphaned blob
    /// stays discoverable through its `media:` entry.
    fn release_media(&self, publication_id: &ObjectId, media_id: &ObjectId) {
        if let Err(e) = self.blob.delete(&media_blob_key(media_id)) {
            warn!(
                "Blob {} of publication {} left orphaned: {}",
                media_id, publication_id, e
            );
            return;
        }
        if let Err(e) = self.kv.delete(&media_key(media_id)) {
            warn!("Media metadata {} left orphaned: {}", media_id, e);
        }
    }

    fn scan_publications(
        &self,
        keep: impl Fn(&Publication) -> bool,
    ) -> Result<Vec<Publication>, ServiceError> {
        let entries = self.kv.scan(PUBLICATION_PREFIX).map_err(storage)?;
        let mut publications = Vec::new();
        for (_, raw) in entries {
            let publication: Publication = decode(&raw).map_err(storage)?;
            if keep(&publication) {
                publications.push(publication);
            }
        }
        publications.sort_by(|a, b| a.publication_date.cmp(&b.publication_date));
        Ok(publications)
    }
}

fn load_like_record(txn: &dyn KVTxn, key: &str, publication_id: &ObjectId) -> Result<LikeRecord, KVError> {
    match txn.get(key)? {
        Some(raw) => decode(&raw),
        None => Ok(LikeRecord::new(*publication_id)),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, KVError> {
    serde_json::to_vec(value).map_err(|e| KVError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, KVError> {
    serde_json::from_slice(raw).map_err(|e| KVError::Serialization(e.to_string()))
}

fn storage(e: KVError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}
