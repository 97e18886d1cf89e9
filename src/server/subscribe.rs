//! Subscriber capture.
//!
//! `POST /api/subscribe` records an email address in the subscriber list.
//! The list is a whole-document store like the ledger, so inserts go through
//! the same conditional-write retry discipline and concurrent signups cannot
//! lose each other. Sending mail to the list is someone else's job.

use std::path::PathBuf;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::AppState;
use crate::store::{StoreError, VersionedFile};

/// Maximum insert attempts under contention.
const MAX_ATTEMPTS: u32 = 5;

/// The versioned subscriber list.
pub struct SubscriberStore {
    store: VersionedFile<Vec<String>>,
}

impl SubscriberStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SubscriberStore {
            store: VersionedFile::new(dir, "subscribers"),
        }
    }

    /// Adds an address if it is not already present.
    ///
    /// Returns `true` if the list changed, `false` for an existing address
    /// (idempotent re-subscribe).
    pub fn add(&self, email: &str) -> Result<bool, StoreError> {
        let mut last_conflict = None;
        for _ in 0..MAX_ATTEMPTS {
            let (mut list, version) = self.store.load()?;
            if list.iter().any(|existing| existing == email) {
                return Ok(false);
            }
            list.push(email.to_string());
            match self.store.save(&list, version) {
                Ok(_) => return Ok(true),
                Err(e @ StoreError::Conflict { .. }) => last_conflict = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_conflict.expect("loop exits early unless a conflict occurred"))
    }

    /// Current list, for tests and operational inspection.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.store.load()?.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub status: &'static str,
}

/// Errors surfaced to the signup form.
#[derive(Debug, Error)]
pub enum SubscribeError {
    /// Missing or unusable address.
    #[error("a valid email address is required")]
    InvalidEmail,

    /// The subscriber list could not be updated.
    #[error("subscriber list unavailable")]
    Store(#[from] StoreError),
}

impl IntoResponse for SubscribeError {
    fn into_response(self) -> Response {
        let status = match &self {
            SubscribeError::InvalidEmail => StatusCode::BAD_REQUEST,
            SubscribeError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Subscriber capture handler.
pub async fn subscribe_handler(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, SubscribeError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(SubscribeError::InvalidEmail);
    }

    let added = state.subscribers().add(email).inspect_err(|e| {
        warn!(error = %e, "failed to record subscriber");
    })?;
    if added {
        info!(email, "new subscriber recorded");
    }

    Ok(Json(SubscribeResponse {
        status: "subscribed",
    }))
}
