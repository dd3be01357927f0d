//! Имитация платёжного шлюза.
//!
//! Настоящего шлюза нет: метод оплаты проверяется на форму, затем после
//! фиксированной задержки выдаётся квитанция. Отказов по сумме или карте
//! не бывает.

use std::time::Duration;
use tracing::info;

use crate::booking::{PaymentError, PaymentMethod, PaymentReceipt, Rupees};
use crate::config::PaymentConfig;

#[derive(Debug, Clone)]
pub struct PaymentSimulator {
    delay: Duration,
}

impl PaymentSimulator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_config(config: &PaymentConfig) -> Self {
        Self::new(config.delay())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Проверяет метод, ждёт задержку и возвращает квитанцию.
    pub async fn process(&self, method: &PaymentMethod, amount: Rupees) -> Result<PaymentReceipt, PaymentError> {
        method.validate()?;
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        info!(method = %method.kind(), amount, "processing simulated payment");
        tokio::time::sleep(self.delay).await;

        let receipt = PaymentReceipt::issue(method, amount)?;
        info!(payment_id = %receipt.payment_id, "simulated payment succeeded");
        Ok(receipt)
    }
}
