use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// None only in development, where the in-memory repository is used instead
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub supabase_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub service_key: String,
    pub bucket: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub quiz_questions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub request_timeout_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Identity provider
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.identity.supabase_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.identity.anon_key = v;
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.identity.jwt_secret = v;
        }
        if let Ok(v) = env::var("SUPABASE_WEBHOOK_SECRET") {
            self.identity.webhook_secret = v;
        }

        // Object store
        if let Ok(v) = env::var("SUPABASE_SERVICE_KEY") {
            self.storage.service_key = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = v.parse().unwrap_or(self.storage.timeout_secs);
        }

        // Generation provider
        if let Ok(v) = env::var("GEMINI_API_KEY") {
            self.generation.api_key = v;
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.generation.model = v;
        }
        if let Ok(v) = env::var("GEMINI_BASE_URL") {
            self.generation.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs = v.parse().unwrap_or(self.generation.timeout_secs);
        }
        if let Ok(v) = env::var("QUIZ_QUESTIONS") {
            self.generation.quiz_questions = parse_var("QUIZ_QUESTIONS", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(self)
    }

    /// Secrets have no defaults; staging and production also require a database.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_JWT_SECRET"));
        }
        if self.identity.webhook_secret.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_WEBHOOK_SECRET"));
        }
        if self.identity.supabase_url.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if self.storage.service_key.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_KEY"));
        }
        if self.generation.api_key.is_empty() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }
        if self.generation.quiz_questions == 0 {
            return Err(ConfigError::Invalid {
                name: "QUIZ_QUESTIONS",
                value: "0".to_string(),
            });
        }
        if self.database.url.is_none() && self.environment != Environment::Development {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            identity: IdentityConfig::default(),
            storage: StorageConfig::defaults(),
            generation: GenerationConfig::defaults(),
            api: ApiConfig {
                request_timeout_secs: 120,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            identity: IdentityConfig::default(),
            storage: StorageConfig::defaults(),
            generation: GenerationConfig::defaults(),
            api: ApiConfig {
                request_timeout_secs: 90,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            identity: IdentityConfig::default(),
            storage: StorageConfig::defaults(),
            generation: GenerationConfig::defaults(),
            api: ApiConfig {
                request_timeout_secs: 60,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

impl StorageConfig {
    fn defaults() -> Self {
        Self {
            service_key: String::new(),
            bucket: "materials".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    fn defaults() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 60,
            quiz_questions: 5,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}
