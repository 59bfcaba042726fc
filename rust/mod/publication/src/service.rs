use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use pubsvc_core::{ObjectId, ServiceError};

use crate::builder::{build_comment, build_publication, build_reply};
use crate::model::{LikeRequest, MediaMeta, NewComment, NewPublication, NewReply};
use crate::store::PublicationStore;
use crate::trends::{Ranking, TrendClient};
use crate::view::{PublicationView, normalize_all};

/// Which way a raw vote moves a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    fn delta(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

/// Result of a media upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedMedia {
    #[serde(rename = "_id")]
    pub id: String,
    pub media_url: String,
    pub size: u64,
}

/// Request-level flows on top of [`PublicationStore`].
///
/// Parses and validates client input, builds new records, and turns the
/// store's absent results into [`ServiceError::NotFound`].
pub struct PublicationService {
    store: PublicationStore,
    trends: Option<TrendClient>,
}

impl PublicationService {
    pub fn new(store: PublicationStore, trends: Option<TrendClient>) -> Self {
        Self { store, trends }
    }

    // -----------------------------------------------------------------------
    // Publications
    // -----------------------------------------------------------------------

    pub fn create_publication(&self, req: NewPublication) -> Result<ObjectId, ServiceError> {
        req.validate()?;
        self.store.insert_publication(&build_publication(req))
    }

    pub fn get_publication(&self, id: &str) -> Result<PublicationView, ServiceError> {
        let id = parse_id(id)?;
        let publication = self
            .store
            .get_publication(&id)?
            .ok_or_else(|| not_found("publication", &id))?;
        Ok(publication.into())
    }

    /// Publications created at or after `since`; all of them when None.
    pub fn list_publications(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PublicationView>, ServiceError> {
        let since = since.unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(normalize_all(self.store.get_publications_since(since)?))
    }

    pub fn delete_publication(&self, id: &str) -> Result<PublicationView, ServiceError> {
        let id = parse_id(id)?;
        let removed = self
            .store
            .delete_publication(&id)?
            .ok_or_else(|| not_found("publication", &id))?;
        Ok(removed.into())
    }

    pub fn publications_of(&self, user: &str) -> Result<Vec<PublicationView>, ServiceError> {
        Ok(normalize_all(self.store.get_publications_by_user(user)?))
    }

    pub fn delete_publications_of(&self, user: &str) -> Result<usize, ServiceError> {
        self.store.delete_publications_of_user(user)
    }

    // -----------------------------------------------------------------------
    // Likes and votes
    // -----------------------------------------------------------------------

    /// Like a publication once per user. Returns whether the like was new.
    pub fn like(&self, id: &str, req: LikeRequest) -> Result<bool, ServiceError> {
        self.set_liked(id, req, true)
    }

    /// Withdraw a like. Returns whether one was withdrawn.
    pub fn unlike(&self, id: &str, req: LikeRequest) -> Result<bool, ServiceError> {
        self.set_liked(id, req, false)
    }

    fn set_liked(&self, id: &str, req: LikeRequest, liked: bool) -> Result<bool, ServiceError> {
        req.validate()?;
        let id = parse_id(id)?;
        self.store
            .set_liked(&id, &req.user, liked)?
            .ok_or_else(|| not_found("publication", &id))
    }

    pub fn is_liked(&self, id: &str, user: &str) -> Result<bool, ServiceError> {
        let id = parse_id(id)?;
        if self.store.get_publication(&id)?.is_none() {
            return Err(not_found("publication", &id));
        }
        self.store.is_liked(&id, user)
    }

    pub fn liked_by(&self, user: &str) -> Result<Vec<PublicationView>, ServiceError> {
        Ok(normalize_all(self.store.get_liked_publications(user)?))
    }

    pub fn vote_publication(&self, id: &str, vote: Vote) -> Result<(), ServiceError> {
        let id = parse_id(id)?;
        found(
            self.store.adjust_publication_likes(&id, vote.delta())?,
            || not_found("publication", &id),
        )
    }

    pub fn vote_comment(&self, id: &str, comment_id: &str, vote: Vote) -> Result<(), ServiceError> {
        let (id, comment_id) = (parse_id(id)?, parse_id(comment_id)?);
        found(
            self.store.adjust_comment_likes(&id, &comment_id, vote.delta())?,
            || not_found("comment", &comment_id),
        )
    }

    pub fn vote_reply(
        &self,
        id: &str,
        comment_id: &str,
        reply_id: &str,
        vote: Vote,
    ) -> Result<(), ServiceError> {
        let (id, comment_id, reply_id) = (parse_id(id)?, parse_id(comment_id)?, parse_id(reply_id)?);
        found(
            self.store
                .adjust_reply_likes(&id, &comment_id, &reply_id, vote.delta())?,
            || not_found("reply", &reply_id),
        )
    }

    // -----------------------------------------------------------------------
    // Comments and replies
    // -----------------------------------------------------------------------

    pub fn add_comment(&self, id: &str, req: NewComment) -> Result<ObjectId, ServiceError> {
        req.validate()?;
        let id = parse_id(id)?;
        self.store
            .insert_comment(&id, build_comment(req))?
            .ok_or_else(|| not_found("publication", &id))
    }

    pub fn add_reply(&self, id: &str, comment_id: &str, req: NewReply) -> Result<ObjectId, ServiceError> {
        req.validate()?;
        let (id, comment_id) = (parse_id(id)?, parse_id(comment_id)?);
        self.store
            .insert_reply(&id, &comment_id, build_reply(req))?
            .ok_or_else(|| not_found("comment", &comment_id))
    }

    pub fn remove_comment(&self, id: &str, comment_id: &str) -> Result<(), ServiceError> {
        let (id, comment_id) = (parse_id(id)?, parse_id(comment_id)?);
        found(self.store.delete_comment(&id, &comment_id)?, || {
            not_found("comment", &comment_id)
        })
    }

    pub fn remove_reply(&self, id: &str, comment_id: &str, reply_id: &str) -> Result<(), ServiceError> {
        let (id, comment_id, reply_id) = (parse_id(id)?, parse_id(comment_id)?, parse_id(reply_id)?);
        found(self.store.delete_reply(&id, &comment_id, &reply_id)?, || {
            not_found("reply", &reply_id)
        })
    }

    // -----------------------------------------------------------------------
    // Media
    // -----------------------------------------------------------------------

    /// Store uploaded bytes and attach them to the publication.
    ///
    /// `metadata` holds any extra key/value pairs the client sent along.
    pub fn upload_media(
        &self,
        id: &str,
        owner: &str,
        content_type: &str,
        metadata: BTreeMap<String, String>,
        data: &[u8],
    ) -> Result<UploadedMedia, ServiceError> {
        let id = parse_id(id)?;
        if owner.trim().is_empty() {
            return Err(ServiceError::Validation("'user' must not be blank".into()));
        }
        if content_type.trim().is_empty() {
            return Err(ServiceError::Validation("'content_type' must not be blank".into()));
        }
        if data.is_empty() {
            return Err(ServiceError::Validation("upload body is empty".into()));
        }
        if self.store.get_publication(&id)?.is_none() {
            return Err(not_found("publication", &id));
        }

        let meta = MediaMeta {
            id: ObjectId::new(),
            owner: owner.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
            uploaded_at: Utc::now(),
            metadata,
        };
        self.store.put_media(&meta, data)?;
        if !self.store.attach_media(&id, &meta.id)? {
            warn!("Publication {} vanished during upload, media {} left unattached", id, meta.id);
            return Err(not_found("publication", &id));
        }
        info!("Media {} attached to publication {}", meta.id, id);

        Ok(UploadedMedia {
            id: meta.id.to_hex(),
            media_url: format!("/{}/images/{}", crate::MODULE_NAME, meta.id),
            size: meta.size,
        })
    }

    pub fn get_media(&self, media_id: &str) -> Result<(MediaMeta, Vec<u8>), ServiceError> {
        let media_id = parse_id(media_id)?;
        self.store
            .get_media(&media_id)?
            .ok_or_else(|| not_found("media", &media_id))
    }

    // -----------------------------------------------------------------------
    // Trending
    // -----------------------------------------------------------------------

    /// Best publications according to the trend ranker, in ranked order.
    ///
    /// Ranked ids that are malformed or no longer exist are skipped.
    pub async fn trending(&self) -> Result<Vec<PublicationView>, ServiceError> {
        let trends = self
            .trends
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("trend ranking is not configured".into()))?;

        let ids = match trends.best().await? {
            Ranking::Best(ids) => ids,
            Ranking::Empty => return Ok(Vec::new()),
        };

        let mut publications = Vec::with_capacity(ids.len());
        for raw in ids {
            let Some(id) = ObjectId::parse(&raw) else {
                warn!("trend ranker returned invalid id '{}'", raw);
                continue;
            };
            match self.store.get_publication(&id)? {
                Some(publication) => publications.push(publication),
                None => warn!("trend ranker returned unknown publication {}", id),
            }
        }
        Ok(normalize_all(publications))
    }
}

fn parse_id(text: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse(text).ok_or_else(|| ServiceError::Validation(format!("invalid id '{text}'")))
}

fn not_found(kind: &str, id: &ObjectId) -> ServiceError {
    ServiceError::NotFound(format!("{kind} '{id}' not found"))
}

fn found(hit: bool, miss: impl FnOnce() -> ServiceError) -> Result<(), ServiceError> {
    if hit { Ok(()) } else { Err(miss()) }
}
