//! Configuration loading from environment.

use std::env;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RATE_LIMIT: u32 = 100;

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Secret that signs pix keys. Rotating it invalidates every open key.
    pub pix_key_secret: String,
    pub rate_limit_per_minute: u32,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    /// OTLP collector endpoint. Traces and metrics are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("PORT") {
            Some(port) => port.parse()?,
            None => DEFAULT_PORT,
        };

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let pix_key_secret = lookup("PIX_KEY_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("PIX_KEY_SECRET environment variable is required"))?;

        let rate_limit_per_minute = match lookup("RATE_LIMIT_PER_MINUTE") {
            Some(limit) => limit.parse()?,
            None => DEFAULT_RATE_LIMIT,
        };

        let log_json = lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.is_empty());

        Ok(Self {
            port,
            database_url,
            pix_key_secret,
            rate_limit_per_minute,
            log_json,
            otlp_endpoint,
        })
    }
}
