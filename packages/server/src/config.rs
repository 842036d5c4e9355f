use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub whatsapp_api_version: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_api_token: String,
    pub webhook_verify_token: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub verification_base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            whatsapp_api_version: env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v21.0".to_string()),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("WHATSAPP_PHONE_NUMBER_ID must be set")?,
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN")
                .context("WHATSAPP_API_TOKEN must be set")?,
            webhook_verify_token: env::var("WEBHOOK_VERIFY_TOKEN")
                .context("WEBHOOK_VERIFY_TOKEN must be set")?,
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "chat-link-auth".to_string()),
            verification_base_url: env::var("VERIFICATION_BASE_URL")
                .context("VERIFICATION_BASE_URL must be set")?,
        })
    }
}
