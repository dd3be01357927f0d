use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::CacheService;
use crate::models::{Movie, Theater};

const MOVIES_KEY: &str = "catalog:movies";
const THEATERS_KEY: &str = "catalog:theaters";

impl CacheService {
    /// Все фильмы: сначала Redis, при промахе или ошибке кеша - БД.
    pub async fn get_movies(&self) -> Result<Vec<Movie>, sqlx::Error> {
        if let Some(movies) = self.read_json::<Vec<Movie>>(MOVIES_KEY).await {
            return Ok(movies);
        }
        let movies = Movie::all(&self.db).await?;
        self.write_json(MOVIES_KEY, &movies).await;
        Ok(movies)
    }

    pub async fn get_movie(&self, id: Uuid) -> Result<Option<Movie>, sqlx::Error> {
        if let Some(movies) = self.read_json::<Vec<Movie>>(MOVIES_KEY).await {
            if let Some(movie) = movies.into_iter().find(|m| m.id == id) {
                return Ok(Some(movie));
            }
        }
        Movie::find(&self.db, id).await
    }

    pub async fn get_theaters(&self) -> Result<Vec<Theater>, sqlx::Error> {
        if let Some(theaters) = self.read_json::<Vec<Theater>>(THEATERS_KEY).await {
            return Ok(theaters);
        }
        let theaters = Theater::all(&self.db, None).await?;
        self.write_json(THEATERS_KEY, &theaters).await;
        Ok(theaters)
    }

    pub async fn invalidate_movies(&self) {
        self.invalidate(MOVIES_KEY).await;
    }

    pub async fn invalidate_theaters(&self) {
        self.invalidate(THEATERS_KEY).await;
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Cache read {} failed: {:?}", key, e);
                return None;
            }
        };
        let data = data?;
        match serde_json::from_str(&data) {
            Ok(value) => {
                debug!("Cache hit {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Cache entry {} is corrupt: {:?}", key, e);
                None
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("Cache serialize {} failed: {:?}", key, e);
                return;
            }
        };
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.set_ex(key, data, self.catalog_ttl.as_secs()).await;
        if let Err(e) = result {
            warn!("Cache write {} failed: {:?}", key, e);
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.redis.conn.clone();
        let result: Result<(), _> = conn.del(key).await;
        match result {
            Ok(()) => debug!("Invalidated {}", key),
            Err(e) => warn!("Cache invalidate {} failed: {:?}", key, e),
        }
    }
}
