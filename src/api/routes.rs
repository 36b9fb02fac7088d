//! HTTP handlers.

use axum::{
    extract::{Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error::ApiError, AppState};
use crate::parse::parse_pub_key;
use crate::types::{KeyRecord, LookupFormat};
use crate::webfinger::WebFingerResponse;

/// The only supported `/pks/lookup` operation.
pub const OP_GET: &str = "get";

/// Content type of an armored key.
pub const PGP_KEYS_CONTENT_TYPE: &str = "application/pgp-keys";

/// GET /
pub async fn home() -> &'static str {
    "Good to see you"
}

/// GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Query parameters of the WebFinger endpoint.
#[derive(Debug, Deserialize)]
pub struct WebFingerParams {
    /// Resource URI, e.g. `acct:alice@example.com`
    pub resource: Option<String>,
}

/// GET /.well-known/webfinger?resource=acct:user@domain
pub async fn webfinger(
    State(state): State<AppState>,
    Query(params): Query<WebFingerParams>,
) -> Result<Json<WebFingerResponse>, ApiError> {
    let resource = params
        .resource
        .ok_or(ApiError::MissingParameter("resource"))?;

    Ok(Json(state.resolver.resolve(&resource)?))
}

/// Query parameters of `/pks/lookup`.
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    /// Operation; only `get` is supported
    pub op: Option<String>,
    /// Key ID, short key ID, fingerprint or email
    pub search: Option<String>,
}

/// GET /pks/lookup?op=get&search=<token>
pub async fn lookup_key(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Response, ApiError> {
    let search = params.search.ok_or(ApiError::MissingParameter("search"))?;
    if params.op.as_deref() != Some(OP_GET) {
        return Err(ApiError::InvalidOp);
    }

    let store = state.store.clone();
    let record = tokio::task::spawn_blocking(move || store.lookup(&search))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(render_key(record, state.lookup_format))
}

fn render_key(record: KeyRecord, format: LookupFormat) -> Response {
    match format {
        LookupFormat::Armored => {
            ([(CONTENT_TYPE, PGP_KEYS_CONTENT_TYPE)], record.public_key).into_response()
        }
        LookupFormat::Json => Json(record).into_response(),
    }
}

/// Form body of `/pks/add`.
#[derive(Debug, Deserialize)]
pub struct AddKeyParams {
    /// The armored public key
    #[serde(default)]
    pub keytext: String,
}

/// POST /pks/add (form field `keytext`)
pub async fn add_key(
    State(state): State<AppState>,
    Form(params): Form<AddKeyParams>,
) -> Result<Json<&'static str>, ApiError> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let record = parse_pub_key(&params.keytext)?;
        Ok(store.add_or_replace(&record)?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json("key added"))
}
