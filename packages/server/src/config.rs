use common::config::UploadConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub cookie_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResearchConfig {
    pub api_url: String,
    /// Research requests fail with 502 until a key is configured.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

/// Initial admin account, created at startup when absent.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    pub research: ResearchConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://lectern.db?mode=rwc")?
            .set_default("auth.token_ttl_hours", 168)?
            .set_default("auth.cookie_name", "lectern_session")?
            .set_default(
                "research.api_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("research.model", "gemini-1.5-flash")?
            .set_default("research.timeout_secs", 30)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LECTERN__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("LECTERN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
