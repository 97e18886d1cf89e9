use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deal_gateway::blast::BlastEmitter;
use deal_gateway::checkout::{PriceTable, StripeCheckout};
use deal_gateway::clicks::FileClickSink;
use deal_gateway::config::Config;
use deal_gateway::ledger::FileLedger;
use deal_gateway::server::{AppState, SubscriberStore, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deal_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration is incomplete");
            std::process::exit(1);
        }
    };

    let issuer = StripeCheckout::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
        PriceTable {
            flame: config.price_flame.clone(),
            inferno: config.price_inferno.clone(),
        },
        config.client_url.clone(),
    );

    let app_state = AppState::new(
        Arc::new(FileLedger::new(config.ledger_dir())),
        Arc::new(FileClickSink::new(config.clicks_path())),
        Arc::new(issuer),
        Arc::new(BlastEmitter::new(config.triggers_dir())),
        Arc::new(SubscriberStore::new(config.subscribers_dir())),
        config.webhook_secret.as_bytes().to_vec(),
        config.fallback_url.clone(),
        config.redirect_timeout,
    );

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
