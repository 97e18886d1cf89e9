//! The tracking redirect endpoint.
//!
//! `GET /go/{deal_id}` resolves a deal id to its affiliate-wrapped
//! destination and answers with a 302. The redirect must never fail visibly:
//! a missing deal, a down ledger store, a malformed document, or a slow read
//! all degrade to the configured fallback URL. Click telemetry is emitted on
//! the way out without ever being awaited.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use tokio::time::timeout;
use tracing::{info, warn};

use super::AppState;
use crate::clicks::spawn_append;
use crate::types::{ClickEvent, DealId};

/// Redirect handler.
///
/// Side-effect order is fixed: ledger read, click emit (spawned), redirect
/// response. The response never waits on the click sink.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let deal_id = DealId::new(deal_id);
    let destination = match timeout(state.redirect_timeout(), state.ledger().load()).await {
        Ok(Ok((deals, _))) => match deals.find(&deal_id) {
            Some(deal) => {
                let event = click_event_from(&deal_id, &deal.brand, &headers);
                info!(
                    deal_id = %deal_id,
                    brand = %deal.brand,
                    click_id = %event.click_id,
                    "click tracked, redirecting"
                );
                spawn_append(state.clicks().clone(), event);
                deal.url.clone()
            }
            None => {
                warn!(deal_id = %deal_id, brand = "Unknown", "unknown deal id, using fallback");
                state.fallback_url().to_string()
            }
        },
        Ok(Err(e)) => {
            warn!(deal_id = %deal_id, error = %e, "ledger unavailable, using fallback");
            state.fallback_url().to_string()
        }
        Err(_) => {
            warn!(deal_id = %deal_id, "ledger read timed out, using fallback");
            state.fallback_url().to_string()
        }
    };

    (StatusCode::FOUND, [(header::LOCATION, destination)])
}

/// Builds the audit record for one click. Request metadata is best-effort:
/// missing or non-UTF-8 headers leave the fields unset.
fn click_event_from(deal_id: &DealId, brand: &str, headers: &HeaderMap) -> ClickEvent {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };

    let mut event = ClickEvent::new(deal_id.clone(), brand);
    event.user_agent = header_value(header::USER_AGENT);
    event.referrer = header_value(header::REFERER);
    // Behind the load balancer the client address is the first entry of
    // x-forwarded-for.
    event.ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_event_captures_request_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "Mozilla/5.0".parse().unwrap());
        headers.insert(header::REFERER, "https://news.example/post".parse().unwrap());
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );

        let event = click_event_from(&DealId::from("7"), "Acme", &headers);

        assert_eq!(event.deal_id, DealId::from("7"));
        assert_eq!(event.brand, "Acme");
        assert_eq!(event.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(event.referrer.as_deref(), Some("https://news.example/post"));
        assert_eq!(event.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn click_event_tolerates_missing_headers() {
        let event = click_event_from(&DealId::from("7"), "Acme", &HeaderMap::new());

        assert!(event.user_agent.is_none());
        assert!(event.referrer.is_none());
        assert!(event.ip.is_none());
    }
}
