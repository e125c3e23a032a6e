use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::str::FromStr;

/// Minimum length accepted by the signed-cookie key derivation.
const SESSION_SECRET_MIN_BYTES: usize = 64;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub db_idle_timeout_seconds: u64,
    pub db_max_lifetime_seconds: u64,
    pub session_secret: Vec<u8>,
}

impl AppConfig {
    /// Reads the process environment. A `.env` file in the working directory,
    /// when present, is loaded first and never overrides variables already set.
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(anyhow!("invalid .env file: {}", err));
            }
        }

        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            db_host: env_or_err("DB_HOST")?,
            db_port: env_parse("DB_PORT")?,
            db_name: env_or_err("DB_NAME")?,
            db_user: env_or_err("DB_USER")?,
            db_password: env_or_err("DB_PASSWORD")?,
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            db_idle_timeout_seconds: env_or_parse("DB_IDLE_TIMEOUT_SECONDS", "300")?,
            db_max_lifetime_seconds: env_or_parse("DB_MAX_LIFETIME_SECONDS", "1800")?,
            session_secret: decode_session_secret(&env_or_err("SESSION_SECRET")?)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_parse<T>(key: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    env_or_err(key)?
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn decode_session_secret(value: &str) -> Result<Vec<u8>> {
    let decoded = STANDARD
        .decode(value.trim().as_bytes())
        .map_err(|err| anyhow!("invalid SESSION_SECRET: {}", err))?;
    if decoded.len() < SESSION_SECRET_MIN_BYTES {
        return Err(anyhow!(
            "invalid SESSION_SECRET: expected at least {} bytes, got {}",
            SESSION_SECRET_MIN_BYTES,
            decoded.len()
        ));
    }
    Ok(decoded)
}
