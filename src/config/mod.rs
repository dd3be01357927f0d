use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::booking::FeePolicy;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub payment: PaymentConfig,
    pub pricing: PricingConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub cors_origins: Vec<String>,
    /// Эти адреса получают права администратора при входе.
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim();
        !email.is_empty() && self.admin_emails.iter().any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format {other:?}, expected pretty or json"),
        }
    }
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub catalog_ttl_secs: u64,
}

// Настройки JWT
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_hours: i64,
}

// Имитация оплаты
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub simulated_delay_ms: u64,
}

impl PaymentConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

// Сбор и налог поверх стоимости мест
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    pub convenience_fee: i64,
    pub tax_percent: u32,
}

impl PricingConfig {
    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            convenience_fee: self.convenience_fee,
            tax_percent: self.tax_percent,
        }
    }
}

// Удержание мест на время оплаты
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub hold_ttl_secs: u64,
    /// Смещение местного времени кинотеатров от UTC, в минутах (IST = 330).
    pub utc_offset_minutes: i32,
}

impl BookingConfig {
    pub fn theater_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix())
    }

    /// Сегодняшняя дата по часам кинотеатров: с ней сравниваются местные времена сеансов.
    pub fn theater_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.theater_offset()).date_naive()
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has invalid value {raw:?}: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let fees = FeePolicy::standard();

        let config = Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parsed("PORT", "8000")?,
                environment: or_default("ENVIRONMENT", "development"),
                rust_log: or_default("RUST_LOG", "showsphere=debug,tower_http=debug"),
                log_format: parsed("LOG_FORMAT", "pretty")?,
                cors_origins: comma_list(&or_default("CORS_ORIGINS", "*")),
                admin_emails: comma_list(&or_default("ADMIN_EMAILS", "")),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
                acquire_timeout_secs: parsed("DB_ACQUIRE_TIMEOUT_SECS", "5")?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
                catalog_ttl_secs: parsed("CATALOG_CACHE_TTL_SECS", "300")?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                expires_in_hours: parsed("JWT_EXPIRES_IN_HOURS", "24")?,
            },
            payment: PaymentConfig {
                simulated_delay_ms: parsed("PAYMENT_DELAY_MS", "1500")?,
            },
            pricing: PricingConfig {
                convenience_fee: parsed("CONVENIENCE_FEE", &fees.convenience_fee.to_string())?,
                tax_percent: parsed("TAX_PERCENT", &fees.tax_percent.to_string())?,
            },
            booking: BookingConfig {
                hold_ttl_secs: parsed("SEAT_HOLD_TTL_SECS", "300")?,
                utc_offset_minutes: parsed("THEATER_UTC_OFFSET_MINUTES", "330")?,
            },
        };

        let offset = config.booking.utc_offset_minutes;
        if FixedOffset::east_opt(offset * 60).is_none() {
            anyhow::bail!("THEATER_UTC_OFFSET_MINUTES is out of range: {offset}");
        }
        Ok(config)
    }
}
