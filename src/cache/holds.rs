//! Короткие удержания мест на время оплаты.
//!
//! Удержание - ключ `hold:{show}:{seat}` со значением-владельцем и TTL.
//! Это только фильтр от гонок на оплате: окончательно место закрепляет
//! первичный ключ `booking_seats` в БД.

use redis::Script;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::CacheService;

// Удаляем ключ, только если он всё ещё наш
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldOutcome {
    Held,
    /// Место уже держит кто-то другой.
    Taken(String),
}

pub fn hold_key(show_id: Uuid, seat: &str) -> String {
    format!("hold:{}:{}", show_id, seat)
}

/// Удержания, взятые одной оплатой. Чужие места сюда не попадают,
/// поэтому откат отпускает только свои.
#[derive(Debug, Default)]
struct HoldLedger {
    taken: Vec<String>,
}

impl HoldLedger {
    /// `Err` с местом, если его держит кто-то другой: дальше не идём.
    fn record(&mut self, seat: &str, acquired: bool) -> Result<(), String> {
        if !acquired {
            return Err(seat.to_string());
        }
        self.taken.push(seat.to_string());
        Ok(())
    }

    fn into_taken(self) -> Vec<String> {
        self.taken
    }
}

impl CacheService {
    /// Берёт удержание на все места. Если хоть одно занято, взятые отпускаются.
    pub async fn hold_seats(
        &self,
        show_id: Uuid,
        seats: &[String],
        owner: Uuid,
        ttl_secs: u64,
    ) -> Result<HoldOutcome, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let owner_value = owner.to_string();
        let mut ledger = HoldLedger::default();

        for seat in seats {
            // SET NX EX - атомарная операция без гонок
            let result: Result<Option<String>, _> = redis::cmd("SET")
                .arg(hold_key(show_id, seat))
                .arg(&owner_value)
                .arg("NX")
                .arg("EX")
                .arg(ttl_secs)
                .query_async(&mut conn)
                .await;

            let acquired = match result {
                Ok(reply) => reply.is_some(),
                Err(e) => {
                    self.release_seats(show_id, &ledger.into_taken(), owner).await;
                    return Err(e);
                }
            };
            if let Err(busy) = ledger.record(seat, acquired) {
                debug!(%show_id, seat = %busy, "seat is held by another checkout");
                self.release_seats(show_id, &ledger.into_taken(), owner).await;
                return Ok(HoldOutcome::Taken(busy));
            }
        }

        Ok(HoldOutcome::Held)
    }

    /// Отпускает удержания владельца. Ошибки только логируются: ключи истекут сами.
    pub async fn release_seats(&self, show_id: Uuid, seats: &[String], owner: Uuid) {
        if seats.is_empty() {
            return;
        }
        let mut conn = self.redis.conn.clone();
        let script = Script::new(RELEASE_SCRIPT);
        let owner_value = owner.to_string();

        for seat in seats {
            let result: Result<i32, _> = script
                .key(hold_key(show_id, seat))
                .arg(&owner_value)
                .invoke_async(&mut conn)
                .await;
            if let Err(e) = result {
                warn!(%show_id, seat = %seat, "failed to release hold: {:?}", e);
            }
        }
    }

    /// Какие из перечисленных мест сейчас удерживаются.
    pub async fn held_seats(
        &self,
        show_id: Uuid,
        seats: &[String],
    ) -> Result<BTreeSet<String>, redis::RedisError> {
        if seats.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut conn = self.redis.conn.clone();
        let mut pipe = redis::pipe();
        for seat in seats {
            pipe.exists(hold_key(show_id, seat));
        }
        let flags: Vec<bool> = pipe.query_async(&mut conn).await?;

        Ok(seats
            .iter()
            .zip(flags)
            .filter(|(_, held)| *held)
            .map(|(seat, _)| seat.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_key_format() {
        let show = Uuid::nil();
        assert_eq!(
            hold_key(show, "C5"),
            "hold:00000000-0000-0000-0000-000000000000:C5"
        );
    }

    #[test]
    fn test_busy_seat_rolls_back_only_own_holds() {
        let mut ledger = HoldLedger::default();
        assert_eq!(ledger.record("C5", true), Ok(()));
        assert_eq!(ledger.record("C6", true), Ok(()));
        assert_eq!(ledger.record("C7", false), Err("C7".to_string()));
        assert_eq!(ledger.into_taken(), vec!["C5", "C6"]);
    }

    #[test]
    fn test_first_seat_busy_releases_nothing() {
        let mut ledger = HoldLedger::default();
        assert_eq!(ledger.record("A1", false), Err("A1".to_string()));
        assert!(ledger.into_taken().is_empty());
    }
}
