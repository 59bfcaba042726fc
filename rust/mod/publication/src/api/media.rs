use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use pubsvc_core::ServiceError;

use super::ServiceState;
use crate::service::{PublicationService, UploadedMedia};

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router(service: Arc<PublicationService>) -> Router {
    Router::new()
        .route(
            "/publications/{id}/media",
            post(upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/images/{id}", get(download_media))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /publications/{id}/media?user=&content_type=
// ---------------------------------------------------------------------------

/// The body is the raw media. `user` and `content_type` are required query
/// parameters; any other parameter is kept as media metadata.
async fn upload_media(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
    Query(mut params): Query<BTreeMap<String, String>>,
    body: Bytes,
) -> Result<Json<UploadedMedia>, ServiceError> {
    let user = params.remove("user").unwrap_or_default();
    let content_type = params.remove("content_type").unwrap_or_default();
    let uploaded = service.upload_media(&id, &user, &content_type, params, &body)?;
    Ok(Json(uploaded))
}

// ---------------------------------------------------------------------------
// GET /images/{id}
// ---------------------------------------------------------------------------

async fn download_media(
    State(service): State<ServiceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let (meta, data) = service.get_media(&id)?;
    Ok(([(header::CONTENT_TYPE, meta.content_type)], data))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};

    use crate::api::test_support::app;

    #[tokio::test]
    async fn upload_then_download() {
        let app = app(None);
        let id = app.publish("foo").await;

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/publications/{id}/media?user=foo&content_type=image/png&camera=x100"))
            .body(Body::from(&b"\x89PNG\r\n"[..]))
            .unwrap();
        let (status, body, _) = app.raw(req).await;
        assert_eq!(status, StatusCode::OK);
        let uploaded: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(uploaded["size"], 6);
        let media_url = uploaded["media_url"].as_str().unwrap().to_string();
        let media_id = uploaded["_id"].as_str().unwrap().to_string();
        assert_eq!(media_url, format!("/publication/images/{media_id}"));

        let (_, doc) = app.send(Method::GET, &format!("/publications/{id}"), None).await;
        assert_eq!(doc["media_url"], media_url);

        let req = Request::builder()
            .uri(format!("/images/{media_id}"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes, content_type) = app.raw(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"\x89PNG\r\n");
        assert_eq!(content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn second_upload_replaces_the_first() {
        let app = app(None);
        let id = app.publish("foo").await;

        let mut media_ids = Vec::new();
        for data in ["one", "two"] {
            let req = Request::builder()
                .method(Method::POST)
                .uri(format!("/publications/{id}/media?user=foo&content_type=image/png"))
                .body(Body::from(data))
                .unwrap();
            let (status, body, _) = app.raw(req).await;
            assert_eq!(status, StatusCode::OK);
            let uploaded: serde_json::Value = serde_json::from_slice(&body).unwrap();
            media_ids.push(uploaded["_id"].as_str().unwrap().to_string());
        }

        let fetch = |media_id: &str| {
            Request::builder()
                .uri(format!("/images/{media_id}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, _, _) = app.raw(fetch(&media_ids[0])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, bytes, _) = app.raw(fetch(&media_ids[1])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"two");
    }

    #[tokio::test]
    async fn upload_without_user_is_rejected() {
        let app = app(None);
        let id = app.publish("foo").await;
        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/publications/{id}/media?content_type=image/png"))
            .body(Body::from("data"))
            .unwrap();
        let (status, _, _) = app.raw(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_media_is_not_found() {
        let app = app(None);
        let req = Request::builder()
            .uri("/images/65f0c2a1e4b0d3f1a2b3c4d5")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = app.raw(req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
