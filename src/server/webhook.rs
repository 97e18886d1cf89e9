//! Payment webhook endpoint.
//!
//! Receives signed provider callbacks, verifies them against the raw request
//! body, and applies completed checkouts to the ledger. Verification is the
//! gate: an unauthenticated request is rejected and nothing else runs. Once
//! the signature has verified, every downstream failure is logged and the
//! delivery is still acknowledged: the provider retries non-2xx responses
//! indefinitely, and a retry storm cannot fix a malformed payload or a down
//! ledger store, only hide it.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::ledger::{PromotionOutcome, promote_deal};
use crate::types::PackageTier;
use crate::webhooks::{CheckoutCompleted, parse_event, verify_signature};

/// Header carrying the provider's signature over the raw request body.
const HEADER_SIGNATURE: &str = "stripe-signature";

/// Rejections visible to the provider. Anything after signature
/// verification is acknowledged instead.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing or unreadable signature header.
    #[error("missing signature header")]
    MissingSignature,

    /// Signature did not verify against the raw body.
    #[error("invalid signature")]
    InvalidSignature,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", self)).into_response()
    }
}

/// Acknowledgement body for accepted deliveries.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub received: bool,
}

/// Webhook handler.
///
/// Verification runs against the raw, unparsed body bytes. Parsing first and
/// re-serializing for verification would not reproduce what the provider
/// signed.
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, WebhookError> {
    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    if !verify_signature(&body, signature, state.webhook_secret(), Utc::now()) {
        warn!("webhook signature verification failed");
        return Err(WebhookError::InvalidSignature);
    }

    match parse_event(&body) {
        Ok(Some(event)) => apply_checkout(&state, event).await,
        Ok(None) => debug!("ignoring unrelated provider event"),
        Err(e) => {
            // Authentic but unusable; retries cannot fix it.
            warn!(error = %e, "acknowledging uninterpretable webhook payload");
        }
    }

    Ok(Json(Ack { received: true }))
}

/// Applies a confirmed checkout: promote the deal, then fire the blast
/// trigger for inferno purchases.
///
/// The trigger is spawned only after the ledger save succeeded (a trigger
/// for an unpersisted promotion would be a dangling effect) and only on a
/// fresh promotion; a duplicate delivery lands on `AlreadyPromoted` and
/// must not blast twice.
async fn apply_checkout(state: &AppState, event: CheckoutCompleted) {
    let CheckoutCompleted { deal_id, package } = event;
    info!(deal_id = %deal_id, package = package.as_str(), "payment confirmed");

    match promote_deal(state.ledger().as_ref(), &deal_id, package).await {
        Ok(PromotionOutcome::Promoted) => {
            info!(deal_id = %deal_id, "deal promoted in ledger");
            if package == PackageTier::Inferno {
                let blast = state.blast().clone();
                tokio::spawn(async move {
                    if let Err(e) = blast.emit(&deal_id) {
                        error!(deal_id = %deal_id, error = %e, "failed to write blast trigger");
                    }
                });
            }
        }
        Ok(PromotionOutcome::AlreadyPromoted) => {
            info!(deal_id = %deal_id, "duplicate delivery, promotion already applied");
        }
        Ok(PromotionOutcome::UnknownDeal) => {
            warn!(deal_id = %deal_id, "completed checkout for a deal not in the ledger");
        }
        Err(e) => {
            // Acknowledged regardless; operators learn of a ledger outage
            // from logs, not from a provider retry storm.
            error!(deal_id = %deal_id, error = %e, "ledger mutation failed, acknowledging anyway");
        }
    }
}
