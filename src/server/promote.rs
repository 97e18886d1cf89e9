//! The promotion purchase endpoint.
//!
//! `POST /api/promote` creates a hosted checkout session and returns its URL.
//! The ledger is never touched here; promotion state changes only when the
//! provider confirms payment through the webhook. A failed or abandoned
//! checkout must leave no trace.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::AppState;
use crate::checkout::CheckoutError;
use crate::types::{DealId, PackageTier};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub deal_id: DealId,
    pub package_type: PackageTier,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub url: String,
}

/// Errors surfaced to the promotion front end as `{"error": ...}` bodies.
#[derive(Debug, Error)]
pub enum PromoteError {
    /// The request named a tier that cannot be purchased.
    #[error("package type must be \"flame\" or \"inferno\"")]
    UnpurchasablePackage,

    /// The provider refused or could not be reached.
    #[error("checkout session creation failed: {0}")]
    Checkout(#[from] CheckoutError),
}

impl IntoResponse for PromoteError {
    fn into_response(self) -> Response {
        let status = match &self {
            PromoteError::UnpurchasablePackage => StatusCode::UNPROCESSABLE_ENTITY,
            PromoteError::Checkout(CheckoutError::InvalidPackage(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PromoteError::Checkout(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Promotion purchase handler.
pub async fn promote_handler(
    State(state): State<AppState>,
    Json(request): Json<PromoteRequest>,
) -> Result<Json<PromoteResponse>, PromoteError> {
    if !request.package_type.is_purchasable() {
        return Err(PromoteError::UnpurchasablePackage);
    }

    let session = state
        .issuer()
        .create_session(&request.deal_id, request.package_type)
        .await
        .inspect_err(|e| {
            warn!(
                deal_id = %request.deal_id,
                package = request.package_type.as_str(),
                error = %e,
                "checkout session creation failed"
            );
        })?;

    Ok(Json(PromoteResponse { url: session.url }))
}
