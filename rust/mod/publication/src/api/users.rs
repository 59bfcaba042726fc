use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use pubsvc_core::ServiceError;

use super::ServiceState;
use crate::service::PublicationService;
use crate::view::PublicationView;

pub fn router(service: Arc<PublicationService>) -> Router {
    Router::new()
        .route(
            "/users/{user}/publications",
            get(publications_of).delete(delete_publications_of),
        )
        .route("/users/{user}/liked", get(liked_by))
        .with_state(service)
}

async fn publications_of(
    State(service): State<ServiceState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<PublicationView>>, ServiceError> {
    Ok(Json(service.publications_of(&user)?))
}

async fn delete_publications_of(
    State(service): State<ServiceState>,
    Path(user): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let deleted = service.delete_publications_of(&user)?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn liked_by(
    State(service): State<ServiceState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<PublicationView>>, ServiceError> {
    Ok(Json(service.liked_by(&user)?))
}
