/// Server configuration
use crate::error::{Result, ServerError};
use crate::services::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use playlister_storage::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default = "default_auth")]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to make credentialed (cookie) requests
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,

    /// Mark the session cookie `Secure`; turn off for plain-HTTP development
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `config.toml` in the working directory; a missing
    /// default file is not an error, a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (PLAYLISTER__AUTH__JWT_SECRET, ...)
        settings = settings.add_source(
            config::Environment::with_prefix("PLAYLISTER")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ServerError::Config(
                "JWT secret is required (set PLAYLISTER__AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            return Err(ServerError::Config(format!(
                "bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            )));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        allowed_origins: default_allowed_origins(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_auth() -> AuthSettings {
    AuthSettings {
        jwt_secret: String::new(),
        jwt_expiration_hours: default_jwt_expiration_hours(),
        secure_cookies: default_secure_cookies(),
        bcrypt_cost: default_bcrypt_cost(),
    }
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_secure_cookies() -> bool {
    true
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            database: DatabaseConfig::default(),
            auth: default_auth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlister_core::Backend;
    use std::io::Write;

    #[test]
    fn defaults_fail_validation_without_secret() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.backend, Backend::Document);
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 5050
allowed_origins = ["http://example.test"]

[database]
backend = "relational"

[auth]
jwt_secret = "from-file"
secure_cookies = false
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.server.allowed_origins, vec!["http://example.test"]);
        assert_eq!(config.database.backend, Backend::Relational);
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert!(!config.auth.secure_cookies);
        assert_eq!(config.auth.bcrypt_cost, 10);
        config.validate().unwrap();
    }

    #[test]
    fn bcrypt_cost_must_be_in_range() {
        let mut config = ServerConfig::default();
        config.auth.jwt_secret = "secret".to_string();

        for cost in [MIN_BCRYPT_COST, 10, MAX_BCRYPT_COST] {
            config.auth.bcrypt_cost = cost;
            assert!(config.validate().is_ok(), "cost {cost} should be accepted");
        }
        for cost in [MIN_BCRYPT_COST - 1, MAX_BCRYPT_COST + 1] {
            config.auth.bcrypt_cost = cost;
            assert!(config.validate().is_err(), "cost {cost} should be rejected");
        }
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = ServerConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
