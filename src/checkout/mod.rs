//! Hosted checkout session creation against the payment provider.
//!
//! Buying promotion never touches the ledger: the gateway asks the provider
//! for a single-use hosted checkout session, hands the session URL to the
//! front end, and forgets about it. The deal id and package tier ride along
//! as session metadata and come back verbatim in the completion webhook;
//! only that webhook mutates the ledger, so an abandoned or failed checkout
//! leaves no trace.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{DealId, PackageTier};

/// Errors that can occur while creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The requested package has no price (only flame and inferno are sold).
    #[error("package {0:?} cannot be purchased")]
    InvalidPackage(PackageTier),

    /// The provider could not be reached.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error.
    #[error("provider rejected session creation ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// A created checkout session, referenced only by its hosted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub url: String,
}

/// Creates hosted checkout sessions for promotion packages.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn create_session(
        &self,
        deal_id: &DealId,
        package: PackageTier,
    ) -> Result<CheckoutSession, CheckoutError>;
}

/// The two flat price tiers, as provider-side price identifiers.
#[derive(Debug, Clone)]
pub struct PriceTable {
    pub flame: String,
    pub inferno: String,
}

impl PriceTable {
    /// Returns the provider price id for a purchasable tier.
    pub fn price_for(&self, package: PackageTier) -> Option<&str> {
        match package {
            PackageTier::Flame => Some(&self.flame),
            PackageTier::Inferno => Some(&self.inferno),
            PackageTier::None => None,
        }
    }
}

/// Session issuer backed by the provider's REST API.
pub struct StripeCheckout {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    prices: PriceTable,
    client_url: String,
}

impl StripeCheckout {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        prices: PriceTable,
        client_url: impl Into<String>,
    ) -> Self {
        StripeCheckout {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
            prices,
            client_url: client_url.into(),
        }
    }
}

/// Builds the form body for a session-creation request: one line item at a
/// fixed price, payment mode, metadata echoed back on completion.
fn session_params(
    deal_id: &DealId,
    package: PackageTier,
    price_id: &str,
    client_url: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("payment_method_types[0]", "card".to_string()),
        ("line_items[0][price]", price_id.to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("mode", "payment".to_string()),
        ("success_url", format!("{}/success", client_url)),
        ("cancel_url", format!("{}/cancel", client_url)),
        ("metadata[dealId]", deal_id.as_str().to_string()),
        ("metadata[packageType]", package.as_str().to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct RawSession {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    error: Option<RawErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RawErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl SessionIssuer for StripeCheckout {
    async fn create_session(
        &self,
        deal_id: &DealId,
        package: PackageTier,
    ) -> Result<CheckoutSession, CheckoutError> {
        let price_id = self
            .prices
            .price_for(package)
            .ok_or(CheckoutError::InvalidPackage(package))?;

        let params = session_params(deal_id, package, price_id, &self.client_url);

        debug!(deal_id = %deal_id, package = package.as_str(), "creating checkout session");

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RawErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(CheckoutError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let session: RawSession = response.json().await?;
        let url = session.url.ok_or(CheckoutError::Provider {
            status: status.as_u16(),
            message: "session response carried no url".to_string(),
        })?;

        Ok(CheckoutSession { url })
    }
}
