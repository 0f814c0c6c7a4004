use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::search::types::DEFAULT_LIMIT;

pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_PATH: &str = ".immoco_session.json";

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub page_limit: u32,
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_limit: DEFAULT_LIMIT,
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let timeout_secs: u64 = match env::var("IMMOCO_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .context("IMMOCO_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let page_limit: u32 = match env::var("IMMOCO_PAGE_LIMIT") {
            Ok(raw) => raw
                .parse()
                .context("IMMOCO_PAGE_LIMIT must be a positive number")?,
            Err(_) => DEFAULT_LIMIT,
        };
        if page_limit == 0 {
            anyhow::bail!("IMMOCO_PAGE_LIMIT must be a positive number");
        }

        Ok(Self {
            api_url: env::var("IMMOCO_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            page_limit,
            session_path: env::var("IMMOCO_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_PATH)),
        })
    }

    /// Root under which listing images are served
    pub fn uploads_url(&self) -> String {
        let root = self.api_url.trim_end_matches('/');
        let root = root.strip_suffix("/api").unwrap_or(root);
        format!("{}/uploads", root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_live_beside_the_api_prefix() {
        let config = Config::default();
        assert_eq!(config.uploads_url(), "http://localhost:8001/uploads");

        let config = Config {
            api_url: "https://immo.example.ga".into(),
            ..Config::default()
        };
        assert_eq!(config.uploads_url(), "https://immo.example.ga/uploads");
    }
}
