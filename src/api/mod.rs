//! HTTP API
//!
//! Routes:
//! - `GET /` and `GET /ping`: liveness
//! - `GET /.well-known/webfinger?resource=acct:…`: WebFinger discovery
//! - `GET /pks/lookup?op=get&search=…`: key lookup
//! - `POST /pks/add` (form field `keytext`, token required): key upload

pub mod auth;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::keystore::KeyStore;
use crate::types::LookupFormat;
use crate::webfinger::WebFingerResolver;

pub use error::ApiError;

/// Per-request time limit.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// State shared across handlers. Immutable apart from the store's backend.
#[derive(Clone)]
pub struct AppState {
    /// The key directory
    pub store: Arc<KeyStore>,
    /// WebFinger resolver for the configured domain
    pub resolver: Arc<WebFingerResolver>,
    /// Tokens accepted by `/pks/add`
    pub api_keys: Arc<Vec<String>>,
    /// How `/pks/lookup` renders a key
    pub lookup_format: LookupFormat,
}

impl AppState {
    /// Build the state from a store and the service configuration.
    pub fn new(store: KeyStore, config: &Config) -> Self {
        Self {
            store: Arc::new(store),
            resolver: Arc::new(WebFingerResolver::new(
                config.webfinger.domain.clone(),
                config.webfinger.resource.clone(),
            )),
            api_keys: Arc::new(config.api.api_keys.clone()),
            lookup_format: config.keyserver.lookup_format,
        }
    }

    /// Whether `token` is one of the configured API keys.
    ///
    /// Every key is compared in constant time, and all keys are checked
    /// even after a match.
    pub fn is_api_key(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        self.api_keys
            .iter()
            .fold(false, |found, key| auth::constant_time_compare(key, token) | found)
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/pks/add", post(routes::add_key))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/", get(routes::home))
        .route("/ping", get(routes::ping))
        .route("/.well-known/webfinger", get(routes::webfinger))
        .route("/pks/lookup", get(routes::lookup_key))
        .merge(protected)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The router wrapped so that trailing slashes are stripped before routing.
pub fn create_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(create_router(state))
}
