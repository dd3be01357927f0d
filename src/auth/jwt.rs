use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// id пользователя
    pub sub: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
    /// id токена, по нему работает выход из сессии
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Сколько секунд токену осталось жить.
    pub fn remaining_secs(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(1) as u64
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::hours(config.expires_in_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: Option<String>, is_admin: bool) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email,
            is_admin,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.to_string(),
            expires_in_hours: 24,
        })
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test-secret");
        let user = Uuid::new_v4();
        let (token, claims) = tokens.issue(user, Some("a@b.in".into()), true).unwrap();
        let verified = tokens.verify(&token).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(verified.sub, user);
        assert!(verified.is_admin);
        assert!(verified.remaining_secs() > 23 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = service("one").issue(Uuid::new_v4(), None, false).unwrap();
        assert!(service("two").verify(&token).is_err());
        assert!(service("one").verify("not-a-token").is_err());
    }
}
