use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use pubsvc_core::ServiceError;

use super::ServiceState;
use crate::model::{LikeRequest, NewPublication, SinceQuery};
use crate::service::{PublicationService, Vote};
use crate::view::PublicationView;

pub fn router(service: Arc<PublicationService>) -> Router {
    Router::new()
        .route("/publications", post(create_publication).get(list_publications))
        .route("/publications/{id}", get(get_publication).delete(delete_publication))
        .route("/publications/{id}/@like", post(like))
        .route("/publications/{id}/@unlike", post(unlike))
        .route("/publications/{id}/likes/{user}", get(like_status))
        .route("/publications/{id}/@upvote", post(upvote))
        .route("/publications/{id}/@downvote", post(downvote))
        .route("/trending", get(trending))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /publications
// ---------------------------------------------------------------------------

async fn create_publication(
    State(service): State<ServiceState>,
    Json(req): Json<NewPublication>,
) -> Result<Json<Value>, ServiceError> {
    let id = service.create_publication(req)?;
    Ok(Json(json!({ "_id": id.to_hex() })))
}

// ---------------------------------------------------------------------------
// GET /publications
// ---------------------------------------------------------------------------

/// `?since=` takes an RFC 3339 instant; see [`SinceQuery`] for offset encoding.
async fn list_publications(
    State(service): State<ServiceState>,
    Query(query): Query<SinceQuery>,
) -> Result<Json<Vec<PublicationView>>, ServiceError> {
    Ok(Json(service.list_publications(query.since)?))
}

// ---------------------------------------------------------------------------
// GET /publications/{id}
// ---------------------------------------------------------------------------

async fn get_publication(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<PublicationView>, ServiceError> {
    Ok(Json(service.get_publication(&id)?))
}

// ---------------------------------------------------------------------------
// DELETE /publications/{id}
// ---------------------------------------------------------------------------

async fn delete_publication(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<PublicationView>, ServiceError> {
    Ok(Json(service.delete_publication(&id)?))
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

async fn like(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<Value>, ServiceError> {
    let changed = service.like(&id, req)?;
    Ok(Json(json!({ "changed": changed })))
}

async fn unlike(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<Value>, ServiceError> {
    let changed = service.unlike(&id, req)?;
    Ok(Json(json!({ "changed": changed })))
}

async fn like_status(
    State(service): State<ServiceState>,
    Path((id, user)): Path<(String, String)>,
) -> Result<Json<Value>, ServiceError> {
    let liked = service.is_liked(&id, &user)?;
    Ok(Json(json!({ "liked": liked })))
}

// ---------------------------------------------------------------------------
// Raw votes
// ---------------------------------------------------------------------------

async fn upvote(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_publication(&id, Vote::Up)?;
    Ok(Json(json!({ "ok": true })))
}

async fn downvote(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_publication(&id, Vote::Down)?;
    Ok(Json(json!({ "ok": true })))
}

// ---------------------------------------------------------------------------
// GET /trending
// ---------------------------------------------------------------------------

async fn trending(
    State(service): State<ServiceState>,
) -> Result<Json<Vec<PublicationView>>, ServiceError> {
    Ok(Json(service.trending().await?))
}
