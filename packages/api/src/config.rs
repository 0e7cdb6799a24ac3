use std::fmt;
use std::path::PathBuf;

use axum::http::{header, HeaderValue, Method};
use lobby_shared::services::game_service::LifecyclePolicy;
use tower_http::cors::{Any, CorsLayer};

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    DynamoDb {
        games_table: String,
        users_table: String,
    },
    Memory {
        users_seed_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub lifecycle_policy: LifecyclePolicy,
    pub port: u16,
    /// Empty means any origin.
    pub allowed_origins: Vec<HeaderValue>,
    /// Running inside the AWS Lambda runtime rather than as a plain server.
    pub lambda: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} environment variable must be set", key),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let store = match get("LOBBY_STORE").as_deref().map(str::trim) {
            None | Some("dynamodb") => StoreBackend::DynamoDb {
                games_table: get("GAMES_TABLE").ok_or(ConfigError::Missing("GAMES_TABLE"))?,
                users_table: get("USERS_TABLE").ok_or(ConfigError::Missing("USERS_TABLE"))?,
            },
            Some("memory") => StoreBackend::Memory {
                users_seed_file: get("USERS_SEED_FILE").map(PathBuf::from),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOBBY_STORE",
                    value: other.to_string(),
                    reason: "expected 'dynamodb' or 'memory'".to_string(),
                })
            }
        };

        let lifecycle_policy = match get("LIFECYCLE_POLICY") {
            Some(value) => value.parse::<LifecyclePolicy>().map_err(|reason| ConfigError::Invalid {
                key: "LIFECYCLE_POLICY",
                value,
                reason,
            })?,
            None => LifecyclePolicy::default(),
        };

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value,
                reason: "expected a port number".to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                        key: "CORS_ALLOWED_ORIGINS",
                        value: origin.to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![],
        };

        Ok(AppConfig {
            store,
            lifecycle_policy,
            port,
            allowed_origins,
            lambda: get("AWS_LAMBDA_RUNTIME_API").is_some(),
        })
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let methods = [
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ];

        if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(Any)
        } else {
            // Credentials cannot be combined with wildcard origins or headers.
            CorsLayer::new()
                .allow_origin(self.allowed_origins.clone())
                .allow_methods(methods)
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn test_dynamodb_is_the_default_store() {
        let config = config_from(&[("GAMES_TABLE", "games"), ("USERS_TABLE", "users")]).unwrap();

        assert_eq!(
            config.store,
            StoreBackend::DynamoDb {
                games_table: "games".to_string(),
                users_table: "users".to_string(),
            }
        );
        assert_eq!(config.lifecycle_policy, LifecyclePolicy::Strict);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.allowed_origins.is_empty());
        assert!(!config.lambda);
    }

    #[test]
    fn test_dynamodb_requires_table_names() {
        let error = config_from(&[("GAMES_TABLE", "games")]).unwrap_err();
        assert!(matches!(error, ConfigError::Missing("USERS_TABLE")));
    }

    #[test]
    fn test_memory_store_with_seed_file() {
        let config = config_from(&[
            ("LOBBY_STORE", "memory"),
            ("USERS_SEED_FILE", "users.json"),
            ("LIFECYCLE_POLICY", "permissive"),
            ("PORT", "8080"),
            ("AWS_LAMBDA_RUNTIME_API", "127.0.0.1:9001"),
        ])
        .unwrap();

        assert_eq!(
            config.store,
            StoreBackend::Memory {
                users_seed_file: Some(PathBuf::from("users.json")),
            }
        );
        assert_eq!(config.lifecycle_policy, LifecyclePolicy::Permissive);
        assert_eq!(config.port, 8080);
        assert!(config.lambda);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let error = config_from(&[("LOBBY_STORE", "postgres")]).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { key: "LOBBY_STORE", .. }));

        let error = config_from(&[("LOBBY_STORE", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Invalid value 'eighty' for PORT: expected a port number"
        );

        let error =
            config_from(&[("LOBBY_STORE", "memory"), ("LIFECYCLE_POLICY", "loose")]).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { key: "LIFECYCLE_POLICY", .. }));
    }

    #[test]
    fn test_allowed_origins_are_split() {
        let config = config_from(&[
            ("LOBBY_STORE", "memory"),
            (
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:3000, https://lobby.example.com",
            ),
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("https://lobby.example.com"),
            ]
        );
        let _ = config.cors_layer();
    }
}
