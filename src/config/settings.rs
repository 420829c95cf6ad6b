use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub vapid: VapidConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Shared secret guarding the dispatch API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

/// VAPID sender identity (RFC 8292).
///
/// Keys are base64url: `public` is the 65-byte uncompressed P-256 point,
/// `private` the raw 32-byte scalar.
#[derive(Debug, Clone, Deserialize)]
pub struct VapidConfig {
    #[serde(default)]
    pub public: String,
    #[serde(default)]
    pub private: String,
    #[serde(default = "default_vapid_subject")]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `memory`, `postgres` or `redis`
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Redis hash key holding subscriptions
    #[serde(default = "default_store_prefix")]
    pub prefix: String,
    /// Create the PostgreSQL table on startup when missing
    #[serde(default = "default_true")]
    pub migrate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Parallel delivery attempts per dispatch (1 = sequential)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Upper bound for a whole dispatch call in milliseconds
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Push service statuses meaning the endpoint is permanently gone
    #[serde(default = "default_prune_status_codes")]
    pub prune_status_codes: Vec<u16>,
    /// TTL header sent to the push service, in seconds
    #[serde(default = "default_push_ttl")]
    pub ttl_seconds: u32,
    /// Per-request HTTP timeout towards the push service
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Icon used when a payload does not carry one
    #[serde(default)]
    pub default_icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_vapid_subject() -> String {
    "mailto:admin@example.com".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_store_prefix() -> String {
    "push:subscriptions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u32 {
    10
}

fn default_idle_timeout() -> u32 {
    300
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_concurrency() -> usize {
    1
}

fn default_prune_status_codes() -> Vec<u16> {
    vec![404, 410]
}

fn default_push_ttl() -> u32 {
    86_400 // 24 hours
}

fn default_request_timeout() -> u64 {
    30
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "ara-push-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("store.backend", "memory")?
            .set_default("redis.url", "redis://localhost:6379")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER_PORT, API_KEY, VAPID_PUBLIC, VAPID_PRIVATE, STORE_BACKEND, DATABASE_URL, ...
            .add_source(environment());

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Environment source; only the list-valued keys are split on `,`.
fn environment() -> Environment {
    Environment::default()
        .separator("_")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("server.cors_origins")
        .with_list_parse_key("dispatch.prune_status_codes")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for VapidConfig {
    fn default() -> Self {
        Self {
            public: String::new(),
            private: String::new(),
            subject: default_vapid_subject(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            prefix: default_store_prefix(),
            migrate: true,
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            deadline_ms: None,
            prune_status_codes: default_prune_status_codes(),
            ttl_seconds: default_push_ttl(),
            request_timeout_seconds: default_request_timeout(),
            default_icon: None,
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);

        let dispatch = DispatchConfig::default();
        assert_eq!(dispatch.max_concurrency, 1);
        assert_eq!(dispatch.prune_status_codes, vec![404, 410]);
        assert!(dispatch.deadline_ms.is_none());
    }

    #[test]
    fn test_environment_keeps_scalars() {
        let vars = [
            ("STORE_BACKEND", "redis"),
            ("SERVER_PORT", "8080"),
            ("API_KEY", "s3cret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings: Settings = Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.store.backend, "redis");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.api.key.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "vapid": { "public": "pub", "private": "priv" },
            "dispatch": { "max_concurrency": 4 }
        }))
        .unwrap();

        assert_eq!(settings.vapid.subject, "mailto:admin@example.com");
        assert_eq!(settings.dispatch.max_concurrency, 4);
        assert_eq!(settings.dispatch.ttl_seconds, 86_400);
        assert_eq!(settings.store.backend, "memory");
        assert!(settings.database.is_none());
        assert_eq!(settings.server_addr(), "0.0.0.0:3000");
    }
}
