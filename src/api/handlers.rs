//! Request handlers and response payloads.

use std::any::Any;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};

use crate::store::InventoryRecord;

use super::AppState;

/// Records drained when `limit` is missing or unusable.
pub const DEFAULT_LIMIT: usize = 10;

/// Query string pairs in request order. Repeated keys are kept.
#[derive(Debug, Default)]
pub struct LimitQuery {
    pairs: Vec<(String, String)>,
}

impl LimitQuery {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Returns the first `limit` value, if any.
    pub fn limit(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == "limit")
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeypairPayload {
    pub public_key: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletsResponse {
    pub success: bool,
    pub count: usize,
    pub keypairs: Vec<KeypairPayload>,
}

impl WalletsResponse {
    fn from_records(records: Vec<InventoryRecord>) -> Self {
        let keypairs: Vec<_> = records
            .into_iter()
            .map(|record| {
                let (public_key, private_key) = record.keypair.into_parts();
                KeypairPayload {
                    public_key,
                    private_key,
                }
            })
            .collect();

        Self {
            success: true,
            count: keypairs.len(),
            keypairs,
        }
    }
}

/// Failures surfaced to API consumers. Store details stay in the log.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Store(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Endpoint not found".to_string()),
            ApiError::Store(category) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch {} keypairs", category),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Parses `limit` the lenient way: leading digits are used, anything else
/// (missing, non-numeric, zero, negative) falls back to the default.
/// Values too large for `usize` saturate, so they drain the whole partition.
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_LIMIT;
    };

    let raw = raw.trim_start();
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];

    if digits.is_empty() {
        return DEFAULT_LIMIT;
    }

    match digits.parse::<usize>() {
        Ok(0) => DEFAULT_LIMIT,
        Ok(limit) => limit,
        // all digits, so only overflow is left
        Err(_) => usize::MAX,
    }
}

pub(crate) async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "message": "Wallet generation service is running",
    }))
}

pub(crate) async fn drain_wallets(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<WalletsResponse>, ApiError> {
    // A segment that is not valid UTF-8 cannot name a category.
    let Ok(Path(name)) = path else {
        return Err(ApiError::NotFound);
    };
    let category = state.category(&name).ok_or(ApiError::NotFound)?;

    let query = match query {
        Ok(Query(pairs)) => LimitQuery::new(pairs),
        Err(e) => {
            debug!(error = %e, "unreadable query string, using defaults");
            LimitQuery::default()
        }
    };
    let limit = parse_limit(query.limit());

    let records = state
        .inventory()
        .drain(category, limit)
        .await
        .map_err(|e| {
            error!(category = %category, error = %e, "failed to drain inventory");
            ApiError::Store(category.name().to_string())
        })?;

    info!(
        category = %category,
        requested = limit,
        count = records.len(),
        "keypairs handed out"
    );
    Ok(Json(WalletsResponse::from_records(records)))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub(crate) fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    ApiError::Internal.into_response()
}
