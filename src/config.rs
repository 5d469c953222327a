// Application settings
// Loaded with the 'config' crate: defaults, then config.toml, then APP_* env vars

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server_address: String,
    // Root of the listings backend, e.g. http://localhost:8000 (no trailing slash needed)
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub categories_cache_secs: u64,
    // Shared HS256 secret of the backend. When absent, session tokens are only checked for expiry.
    pub jwt_secret: Option<String>,
    pub cookie_secure: bool,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Config::builder()
            .set_default("server_address", "127.0.0.1:3000")?
            .set_default("api_base_url", "http://localhost:8000")?
            .set_default("request_timeout_secs", 30)?
            .set_default("categories_cache_secs", 300)?
            .set_default("cookie_secure", false)?
            .add_source(File::with_name("config").required(false))
            // APP_API_BASE_URL, APP_JWT_SECRET, ...
            .add_source(Environment::with_prefix("APP").try_parsing(true));

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings.normalized())
    }

    fn normalized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.jwt_secret = self.jwt_secret.filter(|s| !s.trim().is_empty());
        self
    }
}

#[cfg(test)]
impl Settings {
    pub fn for_tests(api_base_url: &str) -> Self {
        Settings {
            server_address: "127.0.0.1:0".to_string(),
            api_base_url: api_base_url.to_string(),
            request_timeout_secs: 5,
            categories_cache_secs: 60,
            jwt_secret: None,
            cookie_secure: false,
        }
        .normalized()
    }
}
