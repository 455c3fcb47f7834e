use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub redis: RedisConfig,
    pub security: SecurityConfig,
    pub tracking: TrackingConfig,
    pub bootstrap: Option<BootstrapConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub max_body_size: usize,  // in bytes
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub sentinel_enabled: bool,
    pub sentinel_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
    pub min_password_len: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    pub sweep_interval_secs: u64,
    pub session_timeout_secs: i64,  // records idle longer than this are closed
    pub max_session_secs: u64,  // larger reports are rejected
}

/// Default administrator created at startup when no account uses its email.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    pub admin_name: String,
    pub admin_legajo: String,
    pub admin_email: String,
    pub admin_turno: String,
    pub admin_password: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(Self::env_source())
            .build()?;

        config.try_deserialize()
    }

    /// `APP_SERVER__PORT=8080` overrides `server.port`.
    fn env_source() -> config::Environment {
        config::Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
    }

    pub fn redis_url(&self) -> Option<&str> {
        if self.redis.sentinel_enabled {
            self.redis.sentinel_url.as_deref()
        } else {
            Some(&self.redis.url)
        }
    }
}

#[cfg(test)]
impl Config {
    /// In-memory configuration with the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                static_dir: "public".into(),
                max_body_size: 1024 * 1024,
            },
            storage: StorageConfig { backend: StorageBackend::Memory },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".into(),
                sentinel_enabled: false,
                sentinel_url: None,
            },
            security: SecurityConfig { bcrypt_cost: 4, min_password_len: 6 },
            tracking: TrackingConfig {
                sweep_interval_secs: 60,
                session_timeout_secs: 300,
                max_session_secs: 30 * 24 * 3600,
            },
            bootstrap: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_keys_use_single_prefix_separator() {
        let vars = std::collections::HashMap::from([
            ("APP_SERVER__PORT".to_string(), "8080".to_string()),
            ("APP_TRACKING__SESSION_TIMEOUT_SECS".to_string(), "600".to_string()),
            ("OTHER_SERVER__PORT".to_string(), "1".to_string()),
        ]);
        let loaded = config::Config::builder()
            .add_source(Config::env_source().source(Some(vars)))
            .build()
            .unwrap();

        assert_eq!(loaded.get_string("server.port").unwrap(), "8080");
        assert_eq!(loaded.get_string("tracking.session_timeout_secs").unwrap(), "600");
    }

    #[test]
    fn test_redis_url_prefers_sentinel_when_enabled() {
        let mut config = Config::for_tests();
        assert_eq!(config.redis_url(), Some("redis://127.0.0.1:6379"));

        config.redis.sentinel_enabled = true;
        assert_eq!(config.redis_url(), None);

        config.redis.sentinel_url = Some("redis://sentinel:26379".into());
        assert_eq!(config.redis_url(), Some("redis://sentinel:26379"));
    }
}
