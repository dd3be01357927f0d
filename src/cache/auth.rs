use redis::AsyncCommands;
use tracing::info;
use uuid::Uuid;

use crate::auth::LoginFlow;
use crate::cache::CacheService;

/// Сколько живёт незавершённый вход по телефону.
pub const LOGIN_FLOW_TTL_SECS: u64 = 600;

fn revoked_key(jti: Uuid) -> String {
    format!("auth:revoked:{}", jti)
}

fn login_flow_key(flow_id: Uuid) -> String {
    format!("auth:login_flow:{}", flow_id)
}

impl CacheService {
    /// Отзывает токен до конца срока его жизни (для signout).
    pub async fn revoke_token(&self, jti: Uuid, ttl_secs: u64) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let _: () = conn.set_ex(revoked_key(jti), 1, ttl_secs.max(1)).await?;
        info!("Revoked token {}", jti);
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.exists(revoked_key(jti)).await
    }

    pub async fn save_login_flow(&self, flow_id: Uuid, flow: &LoginFlow) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(flow).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(login_flow_key(flow_id), data, LOGIN_FLOW_TTL_SECS).await
    }

    pub async fn load_login_flow(&self, flow_id: Uuid) -> Result<Option<LoginFlow>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(login_flow_key(flow_id)).await?;
        data.map(|data| {
            serde_json::from_str(&data).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            })
        })
        .transpose()
    }

    pub async fn delete_login_flow(&self, flow_id: Uuid) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        conn.del(login_flow_key(flow_id)).await
    }
}
