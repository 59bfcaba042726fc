pub mod api;
pub mod builder;
pub mod hashtag;
pub mod model;
pub mod mutation;
pub mod service;
pub mod store;
pub mod trends;
pub mod view;

use std::sync::Arc;

use axum::Router;
use pubsvc_blob::BlobStore;
use pubsvc_core::Module;
use pubsvc_kv::KVStore;

use service::PublicationService;
use store::PublicationStore;
use trends::TrendClient;

/// Route prefix the daemon nests this module under.
pub const MODULE_NAME: &str = "publication";

/// The Publication module: posts with embedded comments and replies, per-user
/// likes, media uploads and trend-ranked listings.
pub struct PublicationModule {
    service: Arc<PublicationService>,
}

impl PublicationModule {
    /// Create the module over injected storage handles. Without a trend
    /// client the `/trending` route answers 503.
    pub fn new(kv: Arc<dyn KVStore>, blob: Arc<dyn BlobStore>, trends: Option<TrendClient>) -> Self {
        let store = PublicationStore::new(kv, blob);
        Self {
            service: Arc::new(PublicationService::new(store, trends)),
        }
    }
}

impl Module for PublicationModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
