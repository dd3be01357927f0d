use crate::{database::Database, redis_client::RedisClient};
use std::time::Duration;
use tracing::{info, warn};

pub mod auth;
pub mod catalog;
pub mod holds;

pub use holds::HoldOutcome;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    catalog_ttl: Duration,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, catalog_ttl: Duration) -> Self {
        Self {
            redis,
            db,
            catalog_ttl,
        }
    }

    // Прогрев кеша при старте
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        match self.get_movies().await {
            Ok(movies) => info!("Warmed {} movies", movies.len()),
            Err(e) => warn!("Movie warmup failed: {:?}", e),
        }
        match self.get_theaters().await {
            Ok(theaters) => info!("Warmed {} theaters", theaters.len()),
            Err(e) => warn!("Theater warmup failed: {:?}", e),
        }

        info!("Cache warmup done");
    }
}
