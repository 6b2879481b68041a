mod oauth;
mod resource;
mod sandbox;

pub use oauth::OAuthConfig;
pub use resource::ResourceConfig;
pub use sandbox::{SandboxConfig, SandboxMode};

use confique::Config;
use thiserror::Error;

/// Environment variable naming an optional TOML configuration file
const CONFIG_FILE_ENV: &str = "GUARD_CONFIG_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] confique::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top level configuration for the guard server
#[derive(Debug, Config, Clone)]
pub struct GuardConfig {
    /// Port the HTTP server binds to (default: 5000)
    #[config(env = "GUARD_PORT", default = 5000)]
    pub port: u16,

    #[config(nested)]
    pub oauth: OAuthConfig,

    #[config(nested)]
    pub resource: ResourceConfig,

    #[config(nested)]
    pub sandbox: SandboxConfig,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            oauth: OAuthConfig::default(),
            resource: ResourceConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Loads configuration from the environment, then the optional config file, then defaults
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Self::builder().env();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.file(path);
        }
        let config = builder.load()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints that individual fields cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource.uri.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resource.uri must not be empty".to_string(),
            ));
        }
        if self.resource.trusted_issuer.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resource.trusted_issuer must not be empty".to_string(),
            ));
        }
        if self.oauth.token_ttl == 0 {
            return Err(ConfigError::Invalid(
                "oauth.token_ttl must be greater than zero".to_string(),
            ));
        }
        if self.oauth.private_key_path.is_some() != self.oauth.public_key_path.is_some() {
            return Err(ConfigError::Invalid(
                "oauth.private_key_path and oauth.public_key_path must be set together"
                    .to_string(),
            ));
        }
        if self.sandbox.mode == SandboxMode::Process && self.sandbox.program.is_none() {
            return Err(ConfigError::Invalid(
                "sandbox.program is required in process mode".to_string(),
            ));
        }
        Ok(())
    }
}
