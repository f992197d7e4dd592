use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::scraper::StripMode;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub fetch_timeout: Duration,
    pub summarize_timeout: Duration,
    pub request_timeout: Duration,
    /// Include the error message and source chain in 500 responses.
    pub expose_error_details: bool,
    pub strip_mode: StripMode,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let openai_api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| AppError::ConfigError("OPENAI_API_KEY is not set".to_string()))?;

        let openai_base_url = var("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let openai_model = var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

        // Load server configuration with defaults
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(host.trim())
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let fetch_timeout = seconds(var("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS", 10)?;
        let summarize_timeout =
            seconds(var("SUMMARIZE_TIMEOUT_SECS"), "SUMMARIZE_TIMEOUT_SECS", 60)?;
        let request_timeout = seconds(var("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 90)?;

        let expose_error_details = match var("EXPOSE_ERROR_DETAILS") {
            Some(value) => flag(&value).ok_or_else(|| {
                AppError::ConfigError(format!("Invalid EXPOSE_ERROR_DETAILS: {}", value))
            })?,
            None => false,
        };

        let strip_mode = match var("MARKUP_STRIPPING") {
            Some(value) => StripMode::from_str(&value).map_err(AppError::ConfigError)?,
            None => StripMode::default(),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            openai_api_key,
            openai_base_url,
            openai_model,
            fetch_timeout,
            summarize_timeout,
            request_timeout,
            expose_error_details,
            strip_mode,
        })
    }
}

fn seconds(value: Option<String>, key: &str, default: u64) -> Result<Duration> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::ConfigError(format!("Invalid {}: {}", key, value))),
    }
}

fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
