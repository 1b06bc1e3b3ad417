use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::postgres::PostgresConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub use_in_memory: bool,
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl DatabaseSettings {
    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            hostname: self.hostname.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_secs: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub seed_sample_data: bool,
}

impl Settings {
    /// Defaults, overridden by an optional `libraryservice.toml` and then by
    /// `LIBRARY_*` environment variables, e.g. `LIBRARY_DATABASE__HOSTNAME`
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("libraryservice").required(false))
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.use_in_memory", false)?
            .set_default("database.hostname", "127.0.0.1")?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("auth.admin_username", "admin")?
            .set_default("auth.admin_password", "adminpass")?
            .set_default("auth.session_ttl_secs", 8 * 60 * 60)?
            .set_default("auth.secure_cookie", false)?
            .set_default("seed_sample_data", false)
    }
}

#[cfg(test)]
mod settings_tests {
    use config::FileFormat;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.database.use_in_memory);
        assert_eq!(settings.database.postgres_config().hostname, "127.0.0.1");
        assert_eq!(settings.auth.admin_username, "admin");
        assert_eq!(settings.auth.session_ttl_secs, 28_800);
        assert!(!settings.seed_sample_data);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .add_source(File::from_str(
                r#"
                seed_sample_data = true

                [server]
                port = 3001

                [database]
                use_in_memory = true
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 3001);
        assert!(settings.database.use_in_memory);
        assert!(settings.seed_sample_data);
        assert_eq!(settings.database.username, "postgres");
    }
}
