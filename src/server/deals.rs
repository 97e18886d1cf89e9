//! The deals feed.
//!
//! `GET /api/deals` returns the current ledger document for the grid and
//! ticker front ends. Read-only; an empty store is an empty feed, not an
//! error.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use super::AppState;
use crate::ledger::LedgerError;
use crate::types::Deals;

/// Feed failure surfaced to the programmatic caller.
#[derive(Debug, Error)]
#[error("deal feed unavailable: {0}")]
pub struct DealsFeedError(#[from] LedgerError);

impl IntoResponse for DealsFeedError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Deals feed handler.
pub async fn deals_handler(State(state): State<AppState>) -> Result<Json<Deals>, DealsFeedError> {
    let (deals, _) = state.ledger().load().await.inspect_err(|e| {
        error!(error = %e, "failed to load ledger for the deals feed");
    })?;
    Ok(Json(deals))
}
