use anyhow::{Context, Result};

pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

pub struct DatabaseConfig {
    pub url: String,
}

pub struct ServerConfig {
    pub port: u16,
}

pub fn load() -> Result<Config> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let port = std::env::var("PORT")
        .unwrap_or("3000".to_string())
        .parse()
        .context("PORT must be a valid port number")?;

    Ok(Config {
        database: DatabaseConfig { url },
        server: ServerConfig { port },
    })
}

pub fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or("dev-secret-change-me".to_string())
}

/// OTP validity window in minutes.
pub fn otp_ttl_min() -> i64 {
    std::env::var("OTP_TTL_MIN")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5)
}
