use anyhow::{Context, Result};

/// Environment-driven configuration, extended with the broker's signing
/// secret and the second database this system's sync resolver needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub remote_database_url: Option<String>,
    pub judge_token_secret: Vec<u8>,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL").context("Cannot load DATABASE_URL env variable")?,
            remote_database_url: std::env::var("REMOTE_DATABASE_URL").ok(),
            judge_token_secret: std::env::var("JUDGE_TOKEN_SECRET")
                .context("Cannot load JUDGE_TOKEN_SECRET env variable")?
                .into_bytes(),
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
        })
    }
}
