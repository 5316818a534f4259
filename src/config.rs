use std::{env, path::PathBuf};

use secrecy::SecretString;

use crate::limits::LimitPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: SecretString,
    pub payment: PaymentConfig,
    pub media_root: PathBuf,
    pub limit_policy: LimitPolicy,
}

/// Payment gateway credentials.
///
/// Without `PAYMENT_BASE_URL` the gateway runs in sandbox mode and gateway
/// order ids are generated locally.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: SecretString,
    pub base_url: Option<String>,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?
            .into();
        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let limit_policy = match env::var("LIMIT_POLICY") {
            Ok(raw) => raw.parse::<LimitPolicy>()?,
            Err(_) => LimitPolicy::default(),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            payment: PaymentConfig::from_env()?,
            media_root,
            limit_policy,
        })
    }
}

impl PaymentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let key_secret = env::var("PAYMENT_KEY_SECRET")
            .map_err(|_| anyhow::anyhow!("PAYMENT_KEY_SECRET is not set"))?
            .into();
        Ok(Self {
            key_id: env::var("PAYMENT_KEY_ID").unwrap_or_default(),
            key_secret,
            base_url: env::var("PAYMENT_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        })
    }
}
