//! WashWish - laundry booking order service

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use washwish::api::{router, AppState};
use washwish::config::AppConfig;
use washwish::publisher::EventPublisher;
use washwish::{InMemoryOrderRepository, OrderRepository, OrderService, PgOrderRepository, PricingTable};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let repo: Arc<dyn OrderRepository> = match &config.database_url {
        Some(url) => Arc::new(PgOrderRepository::connect(url, config.db_max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory only");
            Arc::new(InMemoryOrderRepository::new())
        }
    };

    let mut orders = OrderService::new(repo, PricingTable::standard());
    if let Some(url) = &config.nats_url {
        match async_nats::connect(url.as_str()).await {
            Ok(client) => orders = orders.with_publisher(EventPublisher::new(client, config.event_subject_prefix.clone())),
            Err(e) => tracing::warn!(error = %e, "NATS unavailable, order events disabled"),
        }
    }

    let app = router(AppState { orders });
    let addr = config.bind_addr();
    tracing::info!("WashWish listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
