pub mod auth;
pub mod booking;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;

use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use booking::{FeePolicy, SeatLayout};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub tokens: auth::TokenService,
    pub payments: services::PaymentSimulator,
    pub layout: Arc<SeatLayout>,
    pub fees: FeePolicy,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(
            &config.database.url,
            config.database.pool_size,
            config.database.acquire_timeout(),
        )
        .await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        tracing::info!("Redis connected");

        let cache = cache::CacheService::new(
            redis.clone(),
            db.clone(),
            Duration::from_secs(config.redis.catalog_ttl_secs),
        );
        let state = Arc::new(Self {
            db,
            redis,
            cache,
            tokens: auth::TokenService::new(&config.jwt),
            payments: services::PaymentSimulator::from_config(&config.payment),
            layout: Arc::new(SeatLayout::standard()),
            fees: config.pricing.fee_policy(),
            config,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            // Warmup cache в фоне
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
