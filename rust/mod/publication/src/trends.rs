//! Client for the external trend ranking service.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use pubsvc_core::ServiceError;

/// Path of the ranking endpoint, relative to the configured base URL.
pub const BEST_PUBLICATIONS_PATH: &str = "/trends/best-publications";

/// Outcome of a ranking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ranking {
    /// Ranked publication ids, best first, as sent by the ranker.
    Best(Vec<String>),
    /// The ranker has nothing to rank yet.
    Empty,
}

#[derive(Clone)]
pub struct TrendClient {
    client: reqwest::Client,
    base_url: String,
}

impl TrendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("trend client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the current ranking.
    ///
    /// 200 carries a JSON array of ids and 204 means an empty ranking. Any
    /// other status, a transport failure or an undecodable body is reported
    /// as [`ServiceError::Unavailable`].
    pub async fn best(&self) -> Result<Ranking, ServiceError> {
        let url = format!("{}{}", self.base_url, BEST_PUBLICATIONS_PATH);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            warn!("trend ranker unreachable at {}: {}", url, e);
            ServiceError::Unavailable(format!("trend ranker unreachable: {e}"))
        })?;

        match resp.status() {
            StatusCode::OK => {
                let ids: Vec<String> = resp.json().await.map_err(|e| {
                    warn!("trend ranker sent an undecodable body: {}", e);
                    ServiceError::Unavailable(format!("trend ranker sent an invalid body: {e}"))
                })?;
                debug!("trend ranker returned {} ids", ids.len());
                Ok(Ranking::Best(ids))
            }
            StatusCode::NO_CONTENT => Ok(Ranking::Empty),
            status => {
                warn!("trend ranker answered {}", status);
                Err(ServiceError::Unavailable(format!(
                    "trend ranker answered {status}"
                )))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::IntoResponse;
    use axum::routing::get;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub(crate) async fn ranker_returning(ids: Vec<String>) -> TrendClient {
        let router = Router::new().route(
            BEST_PUBLICATIONS_PATH,
            get(move || {
                let ids = ids.clone();
                async move { axum::Json(ids) }
            }),
        );
        TrendClient::new(&serve(router).await, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn ok_with_ids_is_a_ranking() {
        let client = ranker_returning(vec!["a".into(), "b".into()]).await;
        assert_eq!(client.best().await.unwrap(), Ranking::Best(vec!["a".into(), "b".into()]));
    }

    #[tokio::test]
    async fn no_content_is_empty() {
        let router = Router::new().route(
            BEST_PUBLICATIONS_PATH,
            get(|| async { AxumStatus::NO_CONTENT }),
        );
        let client = TrendClient::new(&serve(router).await, Duration::from_secs(5)).unwrap();
        assert_eq!(client.best().await.unwrap(), Ranking::Empty);
    }

    #[tokio::test]
    async fn other_status_is_unavailable() {
        let router = Router::new().route(
            BEST_PUBLICATIONS_PATH,
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response() }),
        );
        let client = TrendClient::new(&serve(router).await, Duration::from_secs(5)).unwrap();
        let err = client.best().await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_unavailable() {
        let router = Router::new().route(BEST_PUBLICATIONS_PATH, get(|| async { "not json" }));
        let client = TrendClient::new(&serve(router).await, Duration::from_secs(5)).unwrap();
        assert!(matches!(client.best().await, Err(ServiceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unreachable_ranker_is_unavailable() {
        // Bind then drop, so nothing is listening on the port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TrendClient::new(&format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url(), format!("http://{addr}"));
        assert!(matches!(client.best().await, Err(ServiceError::Unavailable(_))));
    }
}
