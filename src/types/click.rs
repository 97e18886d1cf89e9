//! The click event: an audit record of one redirect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClickId, DealId};

/// An audit record of one redirect, appended to the click sink exactly once
/// per successful redirect attempt and never mutated afterwards.
///
/// Request metadata is best-effort: a missing or non-UTF-8 header simply
/// leaves the field `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub click_id: ClickId,
    pub deal_id: DealId,
    /// Brand name denormalized from the deal at click time.
    pub brand: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl ClickEvent {
    /// Creates a new click event stamped with a fresh id and the current time.
    pub fn new(deal_id: DealId, brand: impl Into<String>) -> Self {
        ClickEvent {
            click_id: ClickId::generate(),
            deal_id,
            brand: brand.into(),
            timestamp: Utc::now(),
            user_agent: None,
            ip: None,
            referrer: None,
        }
    }
}
