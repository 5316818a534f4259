use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::{config::PaymentConfig, error::AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Order registered with the payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Client for the hosted-checkout payment gateway.
#[derive(Clone)]
pub struct PaymentGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl PaymentGateway {
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.config.key_id
    }

    /// Register an order of `amount` minor units with the gateway.
    pub async fn create_order(&self, amount: i64, receipt: &str) -> AppResult<GatewayOrder> {
        let Some(base_url) = self.config.base_url.as_deref() else {
            let id = format!("order_{}", Uuid::new_v4().simple());
            tracing::debug!(gateway_order_id = %id, "sandbox gateway order created");
            return Ok(GatewayOrder {
                id,
                amount,
                currency: self.config.currency.clone(),
            });
        };

        let url = format!("{}/v1/orders", base_url.trim_end_matches('/'));
        let order = self
            .client
            .post(url)
            .basic_auth(
                &self.config.key_id,
                Some(self.config.key_secret.expose_secret()),
            )
            .json(&CreateOrderBody {
                amount,
                currency: &self.config.currency,
                receipt,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<GatewayOrder>()
            .await?;

        tracing::info!(gateway_order_id = %order.id, amount, "gateway order created");
        Ok(order)
    }

    /// Hex HMAC-SHA256 of `"{order_id}|{payment_id}"` under the key secret.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> String {
        self.mac(gateway_order_id, payment_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    pub fn verify_signature(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature.trim()) else {
            return false;
        };
        let Some(mac) = self.mac(gateway_order_id, payment_id) else {
            return false;
        };
        mac.verify_slice(&provided).is_ok()
    }

    fn mac(&self, gateway_order_id: &str, payment_id: &str) -> Option<HmacSha256> {
        let mut mac =
            HmacSha256::new_from_slice(self.config.key_secret.expose_secret().as_bytes()).ok()?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Some(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(secret: &str) -> PaymentGateway {
        PaymentGateway::new(PaymentConfig {
            key_id: "key_test".into(),
            key_secret: secret.to_string().into(),
            base_url: None,
            currency: "INR".into(),
        })
    }

    #[test]
    fn signature_round_trips_for_same_secret() {
        let gw = gateway("s3cret");
        let signature = gw.sign("order_abc", "pay_123");
        assert!(gw.verify_signature("order_abc", "pay_123", &signature));
    }

    #[test]
    fn signature_rejects_tampered_payment_or_secret() {
        let gw = gateway("s3cret");
        let signature = gw.sign("order_abc", "pay_123");
        assert!(!gw.verify_signature("order_abc", "pay_999", &signature));
        assert!(!gateway("other").verify_signature("order_abc", "pay_123", &signature));
        assert!(!gw.verify_signature("order_abc", "pay_123", "not-hex"));
    }

    #[tokio::test]
    async fn sandbox_mode_generates_local_order_ids() {
        let order = gateway("s3cret").create_order(2500, "ORD-1").await.unwrap();
        assert!(order.id.starts_with("order_"));
        assert_eq!(order.amount, 2500);
        assert_eq!(order.currency, "INR");
    }
}
