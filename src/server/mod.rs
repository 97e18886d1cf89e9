//! HTTP server for the deal gateway.
//!
//! This module implements the HTTP surface that:
//! - Redirects affiliate clicks while recording telemetry
//! - Sells promotion packages through hosted checkout sessions
//! - Accepts signed payment webhooks and applies them to the ledger
//! - Serves the deals feed and captures subscribers
//!
//! # Endpoints
//!
//! - `GET /go/{deal_id}` - 302 redirect to the deal's affiliate URL
//! - `POST /api/promote` - create a checkout session, returns `{url}`
//! - `POST /webhook/payment` - signed provider callback
//! - `GET /api/deals` - current ledger document as JSON
//! - `POST /api/subscribe` - record a subscriber email
//! - `GET /health` - liveness probe

use std::sync::Arc;
use std::time::Duration;

pub mod deals;
pub mod health;
pub mod promote;
pub mod redirect;
pub mod subscribe;
pub mod webhook;

pub use deals::deals_handler;
pub use health::health_handler;
pub use promote::promote_handler;
pub use redirect::redirect_handler;
pub use subscribe::{SubscriberStore, subscribe_handler};
pub use webhook::webhook_handler;

use crate::blast::BlastEmitter;
use crate::checkout::SessionIssuer;
use crate::clicks::ClickSink;
use crate::ledger::DealLedger;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It holds the
/// service seams (ledger, click sink, session issuer, blast emitter) plus
/// the few request-path configuration values.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    ledger: Arc<dyn DealLedger>,
    clicks: Arc<dyn ClickSink>,
    issuer: Arc<dyn SessionIssuer>,
    blast: Arc<BlastEmitter>,
    subscribers: Arc<SubscriberStore>,

    /// Shared secret for webhook signature verification.
    webhook_secret: Vec<u8>,

    /// Safe destination when a redirect cannot be resolved.
    fallback_url: String,

    /// Bound on the ledger read during a redirect.
    redirect_timeout: Duration,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<dyn DealLedger>,
        clicks: Arc<dyn ClickSink>,
        issuer: Arc<dyn SessionIssuer>,
        blast: Arc<BlastEmitter>,
        subscribers: Arc<SubscriberStore>,
        webhook_secret: impl Into<Vec<u8>>,
        fallback_url: impl Into<String>,
        redirect_timeout: Duration,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                ledger,
                clicks,
                issuer,
                blast,
                subscribers,
                webhook_secret: webhook_secret.into(),
                fallback_url: fallback_url.into(),
                redirect_timeout,
            }),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn DealLedger> {
        &self.inner.ledger
    }

    pub fn clicks(&self) -> &Arc<dyn ClickSink> {
        &self.inner.clicks
    }

    pub fn issuer(&self) -> &Arc<dyn SessionIssuer> {
        &self.inner.issuer
    }

    pub fn blast(&self) -> &Arc<BlastEmitter> {
        &self.inner.blast
    }

    pub fn subscribers(&self) -> &Arc<SubscriberStore> {
        &self.inner.subscribers
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    pub fn fallback_url(&self) -> &str {
        &self.inner.fallback_url
    }

    pub fn redirect_timeout(&self) -> Duration {
        self.inner.redirect_timeout
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/go/{deal_id}", get(redirect_handler))
        .route("/api/promote", post(promote_handler))
        .route("/api/deals", get(deals_handler))
        .route("/api/subscribe", post(subscribe_handler))
        .route("/webhook/payment", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
