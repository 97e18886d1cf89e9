//! Payment provider event parsing.
//!
//! The provider delivers many event types; the gateway acts on exactly one,
//! `checkout.session.completed`, whose session metadata echoes back the
//! `dealId` and `packageType` embedded when the session was created.
//!
//! # Parsing Strategy
//!
//! 1. The event type is read from the payload's `type` field
//! 2. Event types other than checkout completion return `Ok(None)`
//!    (acknowledged upstream, never an error; the provider retries non-2xx)
//! 3. A completed checkout without usable metadata is an error; the caller
//!    decides whether to reject or acknowledge-and-log

use serde::Deserialize;
use thiserror::Error;

use crate::types::{DealId, PackageTier};

/// The one event type that mutates the ledger.
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Error type for webhook payload parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A completed checkout arrived without the metadata the gateway
    /// embedded at session creation.
    #[error("checkout completion is missing {field} metadata")]
    MissingMetadata { field: &'static str },

    /// The metadata names a package that cannot be purchased.
    #[error("invalid package type in metadata: {0:?}")]
    InvalidPackage(String),
}

/// A verified, completed checkout ready to apply to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub deal_id: DealId,
    pub package: PackageTier,
}

// ============================================================================
// Raw payload structures for deserialization
//
// These match the provider's event envelope. Fields are Option so an
// unrelated event type parses without them; required fields are validated
// explicitly once the type is known.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    object: Option<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "dealId")]
    deal_id: Option<DealId>,
    #[serde(rename = "packageType")]
    package_type: Option<String>,
}

/// Parses a raw provider event payload.
///
/// # Returns
///
/// * `Ok(Some(event))` - a completed checkout with usable metadata
/// * `Ok(None)` - any other event type (ignored, not an error)
/// * `Err(e)` - malformed payload, or a completed checkout with missing or
///   invalid metadata
pub fn parse_event(payload: &[u8]) -> Result<Option<CheckoutCompleted>, ParseError> {
    let event: RawEvent = serde_json::from_slice(payload)?;

    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(None);
    }

    let metadata = event
        .data
        .and_then(|d| d.object)
        .and_then(|o| o.metadata)
        .ok_or(ParseError::MissingMetadata { field: "session" })?;

    let deal_id = metadata
        .deal_id
        .ok_or(ParseError::MissingMetadata { field: "dealId" })?;
    let package_type = metadata.package_type.ok_or(ParseError::MissingMetadata {
        field: "packageType",
    })?;

    let package = match package_type.as_str() {
        "flame" => PackageTier::Flame,
        "inferno" => PackageTier::Inferno,
        other => return Err(ParseError::InvalidPackage(other.to_string())),
    };

    Ok(Some(CheckoutCompleted { deal_id, package }))
}
