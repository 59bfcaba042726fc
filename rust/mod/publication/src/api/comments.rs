use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use pubsvc_core::ServiceError;

use super::ServiceState;
use crate::model::{NewComment, NewReply};
use crate::service::{PublicationService, Vote};

pub fn router(service: Arc<PublicationService>) -> Router {
    Router::new()
        .route("/publications/{id}/comments", post(add_comment))
        .route("/publications/{id}/comments/{cid}", delete(remove_comment))
        .route("/publications/{id}/comments/{cid}/@upvote", post(upvote_comment))
        .route("/publications/{id}/comments/{cid}/@downvote", post(downvote_comment))
        .route("/publications/{id}/comments/{cid}/replies", post(add_reply))
        .route("/publications/{id}/comments/{cid}/replies/{rid}", delete(remove_reply))
        .route("/publications/{id}/comments/{cid}/replies/{rid}/@upvote", post(upvote_reply))
        .route("/publications/{id}/comments/{cid}/replies/{rid}/@downvote", post(downvote_reply))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

async fn add_comment(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
    Json(req): Json<NewComment>,
) -> Result<Json<Value>, ServiceError> {
    let comment_id = service.add_comment(&id, req)?;
    Ok(Json(json!({ "_id": comment_id.to_hex() })))
}

async fn remove_comment(
    State(service): State<ServiceState>,
    Path((id, cid)): Path<(String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.remove_comment(&id, &cid)?;
    Ok(Json(json!({ "deleted": true })))
}

async fn upvote_comment(
    State(service): State<ServiceState>,
    Path((id, cid)): Path<(String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_comment(&id, &cid, Vote::Up)?;
    Ok(Json(json!({ "ok": true })))
}

async fn downvote_comment(
    State(service): State<ServiceState>,
    Path((id, cid)): Path<(String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_comment(&id, &cid, Vote::Down)?;
    Ok(Json(json!({ "ok": true })))
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

async fn add_reply(
    State(service): State<ServiceState>,
    Path((id, cid)): Path<(String, String)>,
    Json(req): Json<NewReply>,
) -> Result<Json<Value>, ServiceError> {
    let reply_id = service.add_reply(&id, &cid, req)?;
    Ok(Json(json!({ "_id": reply_id.to_hex() })))
}

async fn remove_reply(
    State(service): State<ServiceState>,
    Path((id, cid, rid)): Path<(String, String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.remove_reply(&id, &cid, &rid)?;
    Ok(Json(json!({ "deleted": true })))
}

async fn upvote_reply(
    State(service): State<ServiceState>,
    Path((id, cid, rid)): Path<(String, String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_reply(&id, &cid, &rid, Vote::Up)?;
    Ok(Json(json!({ "ok": true })))
}

async fn downvote_reply(
    State(service): State<ServiceState>,
    Path((id, cid, rid)): Path<(String, String, String)>,
) -> Result<Json<Value>, ServiceError> {
    service.vote_reply(&id, &cid, &rid, Vote::Down)?;
    Ok(Json(json!({ "ok": true })))
}
