// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Toolbridge Server Configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub clients: ClientsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpServerConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:47300")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Allowed CORS origins (empty = allow all, use specific origins in production)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
            cors_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL. Absent means memory-only caching.
    pub redis_url: Option<String>,

    /// Default TTL for cached tool results, in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,

    /// TTL for fetched page content, in seconds
    #[serde(default = "default_fetch_ttl")]
    pub fetch_ttl_secs: u64,

    /// TTL for search results, in seconds
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl_secs: default_cache_ttl(),
            fetch_ttl_secs: default_fetch_ttl(),
            search_ttl_secs: default_search_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn fetch_ttl(&self) -> Duration {
        Duration::from_secs(self.fetch_ttl_secs)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }
}

/// API keys for the upstream services. Any of them may be absent; the
/// corresponding tools stay registered but report the missing credential.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    pub jina_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub deepl_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientsConfig {
    /// Jina request timeout in seconds
    #[serde(default = "default_jina_timeout")]
    pub jina_timeout_secs: u64,

    /// Gemini request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub gemini_timeout_secs: u64,

    /// DeepL request timeout in seconds
    #[serde(default = "default_deepl_timeout")]
    pub deepl_timeout_secs: u64,

    /// Gemini model name
    pub gemini_model: Option<String>,

    /// DeepL endpoint (the free and pro tiers use different hosts)
    #[serde(default = "default_deepl_api_url")]
    pub deepl_api_url: String,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            jina_timeout_secs: default_jina_timeout(),
            gemini_timeout_secs: default_gemini_timeout(),
            deepl_timeout_secs: default_deepl_timeout(),
            gemini_model: None,
            deepl_api_url: default_deepl_api_url(),
        }
    }
}

impl ClientsConfig {
    pub fn jina_timeout(&self) -> Duration {
        Duration::from_secs(self.jina_timeout_secs)
    }

    pub fn gemini_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini_timeout_secs)
    }

    pub fn deepl_timeout(&self) -> Duration {
        Duration::from_secs(self.deepl_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Enable authentication (default: false for development)
    #[serde(default)]
    pub enabled: bool,

    /// Path to the API key store
    #[serde(default = "default_keys_file")]
    pub keys_file: PathBuf,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            keys_file: default_keys_file(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,

    /// Maximum requests per window
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,

    /// Time window in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
        }
    }
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:47300".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_fetch_ttl() -> u64 {
    1800
}

fn default_search_ttl() -> u64 {
    900
}

fn default_jina_timeout() -> u64 {
    30
}

fn default_gemini_timeout() -> u64 {
    60
}

fn default_deepl_timeout() -> u64 {
    30
}

fn default_deepl_api_url() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_keys_file() -> PathBuf {
    PathBuf::from("api_keys.json")
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_rate_limit_max_requests() -> u32 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            cache: CacheConfig::default(),
            credentials: CredentialsConfig::default(),
            clients: ClientsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - TOOLBRIDGE_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:47300)
    /// - TOOLBRIDGE_AUTH_ENABLED: Enable authentication (default: false)
    /// - TOOLBRIDGE_KEYS_FILE: Path to the API key store
    /// - REDIS_URL: Redis connection URL for the cache backend
    /// - CACHE_TTL: Default cache TTL in seconds
    /// - JINA_API_KEY, GEMINI_API_KEY, DEEPL_API_KEY: upstream credentials
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TOOLBRIDGE_HTTP_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(enabled) = std::env::var("TOOLBRIDGE_AUTH_ENABLED") {
            config.auth.enabled = enabled.parse().unwrap_or(false);
        }

        if let Ok(path) = std::env::var("TOOLBRIDGE_KEYS_FILE") {
            config.auth.keys_file = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.cache.redis_url = Some(url);
        }

        if let Ok(ttl) = std::env::var("CACHE_TTL") {
            if let Ok(val) = ttl.parse() {
                config.cache.default_ttl_secs = val;
            }
        }

        if let Ok(key) = std::env::var("JINA_API_KEY") {
            config.credentials.jina_api_key = Some(key);
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.credentials.gemini_api_key = Some(key);
        }

        if let Ok(key) = std::env::var("DEEPL_API_KEY") {
            config.credentials.deepl_api_key = Some(key);
        }

        if let Ok(url) = std::env::var("DEEPL_API_URL") {
            config.clients.deepl_api_url = url;
        }

        config
    }

    /// Load configuration with priority: env > file > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        Ok(Self::merge_with_env(config))
    }

    /// Merge config with environment variables (env takes priority)
    fn merge_with_env(mut config: Self) -> Self {
        let env_config = Self::from_env();

        if std::env::var("TOOLBRIDGE_HTTP_ADDR").is_ok() {
            config.server.listen_addr = env_config.server.listen_addr;
        }
        if std::env::var("TOOLBRIDGE_AUTH_ENABLED").is_ok() {
            config.auth.enabled = env_config.auth.enabled;
        }
        if std::env::var("TOOLBRIDGE_KEYS_FILE").is_ok() {
            config.auth.keys_file = env_config.auth.keys_file;
        }
        if std::env::var("REDIS_URL").is_ok() {
            config.cache.redis_url = env_config.cache.redis_url;
        }
        if std::env::var("CACHE_TTL").is_ok() {
            config.cache.default_ttl_secs = env_config.cache.default_ttl_secs;
        }
        if std::env::var("JINA_API_KEY").is_ok() {
            config.credentials.jina_api_key = env_config.credentials.jina_api_key;
        }
        if std::env::var("GEMINI_API_KEY").is_ok() {
            config.credentials.gemini_api_key = env_config.credentials.gemini_api_key;
        }
        if std::env::var("DEEPL_API_KEY").is_ok() {
            config.credentials.deepl_api_key = env_config.credentials.deepl_api_key;
        }
        if std::env::var("DEEPL_API_URL").is_ok() {
            config.clients.deepl_api_url = env_config.clients.deepl_api_url;
        }

        config
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.cache.fetch_ttl_secs == 0 || self.cache.search_ttl_secs == 0 {
            anyhow::bail!("Cache TTLs must be greater than zero");
        }

        if self.clients.jina_timeout_secs == 0
            || self.clients.gemini_timeout_secs == 0
            || self.clients.deepl_timeout_secs == 0
        {
            anyhow::bail!("Client timeouts must be greater than zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:47300");
        assert!(!config.auth.enabled);
        assert_eq!(config.cache.fetch_ttl_secs, 1800);
        assert_eq!(config.cache.search_ttl_secs, 900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:9000"

            [cache]
            redis_url = "redis://localhost:6379"
            fetch_ttl_secs = 600

            [auth]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(
            config.cache.redis_url.as_deref(),
            Some("redis://localhost:6379")
        );
        assert_eq!(config.cache.fetch_ttl_secs, 600);
        // Unset fields fall back to defaults.
        assert_eq!(config.cache.search_ttl_secs, 900);
        assert!(config.auth.enabled);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = ServerConfig::default();
        config.cache.fetch_ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}
