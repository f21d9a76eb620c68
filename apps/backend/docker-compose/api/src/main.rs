#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use axum::{Router, routing::get};
use shutterlink_api::{
    construct_router, orders,
    payment::{DynPaymentGateway, StripeGateway},
    schema,
    state::{AppState, State},
};
use std::{sync::Arc, time::Duration};
use tower_http::{services::ServeDir, trace::TraceLayer};

mod config;
mod storage;
mod telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let prometheus = telemetry::init_telemetry()?;

    tracing::info!("Starting Shutterlink API Service");

    let config = config::Config::from_env()?;
    tracing::info!(
        "Loaded configuration: provider={}, currency={}",
        config.storage.provider(),
        config.api.currency
    );

    let db = State::connect(&config.database_url, config.sql_logging).await?;
    schema::sync(&db).await?;

    let store = storage::create_store(&config)?;

    let payments: Option<DynPaymentGateway> = match &config.stripe_secret_key {
        Some(key) => Some(Arc::new(StripeGateway::new(key.clone()))),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, checkout is disabled");
            None
        }
    };
    if config.api.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, payment webhooks will be refused");
    }

    let state = Arc::new(State::new(config.api.clone(), db, store, payments));
    spawn_reconciler(state.clone(), config.reconcile_interval);

    let metrics = Router::new()
        .route("/metrics", get(telemetry::handler))
        .with_state(prometheus);

    let mut app = Router::new()
        .merge(construct_router(state.clone()))
        .merge(metrics);
    if let Some(root) = storage::served_root(&config) {
        app = app.nest_service("/uploads", ServeDir::new(root));
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically fails orders whose payment session never got attached.
fn spawn_reconciler(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().naive_utc();
            let stale_after = state.config.stale_order_after();
            if let Err(err) = orders::reconcile_stale_orders(&state.db, stale_after, now).await {
                tracing::error!(error = %err, "Stale order sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
