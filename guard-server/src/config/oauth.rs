//! Authorization server configuration

use confique::Config;

/// Authorization server configuration
#[derive(Debug, Config, Clone)]
pub struct OAuthConfig {
    /// Mount the authorization server routes (default: true)
    #[config(env = "GUARD_OAUTH_ENABLED", default = true)]
    pub enabled: bool,

    /// Issuer identity placed in the `iss` claim (default: https://auth.example.com)
    #[config(env = "GUARD_OAUTH_ISSUER", default = "https://auth.example.com")]
    pub issuer: String,

    /// Token endpoint advertised in metadata (default: `<issuer>/token`)
    #[config(env = "GUARD_OAUTH_TOKEN_ENDPOINT")]
    pub token_endpoint: Option<String>,

    /// Access token lifetime in seconds (default: 3600 = 1 hour)
    #[config(env = "GUARD_OAUTH_TOKEN_TTL", default = 3600)]
    pub token_ttl: u64,

    /// Subject placed in every issued token (default: user-12345)
    #[config(env = "GUARD_OAUTH_SUBJECT", default = "user-12345")]
    pub subject: String,

    /// PEM file holding the RSA signing key
    #[config(env = "GUARD_OAUTH_PRIVATE_KEY_PATH")]
    pub private_key_path: Option<String>,

    /// PEM file holding the RSA verification key
    #[config(env = "GUARD_OAUTH_PUBLIC_KEY_PATH")]
    pub public_key_path: Option<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            issuer: "https://auth.example.com".to_string(),
            token_endpoint: None,
            token_ttl: 3600,
            subject: "user-12345".to_string(),
            private_key_path: None,
            public_key_path: None,
        }
    }
}

impl OAuthConfig {
    /// Returns the configured token endpoint, or `<issuer>/token`
    pub fn token_endpoint(&self) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/token", self.issuer.trim_end_matches('/')))
    }

    /// Returns the URL at which the JWKS document is published
    pub fn jwks_uri(&self) -> String {
        format!(
            "{}/.well-known/jwks.json",
            self.issuer.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_oauth_config() {
        let config = OAuthConfig::default();
        assert!(config.enabled);
        assert_eq!(config.issuer, "https://auth.example.com");
        assert_eq!(config.token_ttl, 3600);
        assert_eq!(config.subject, "user-12345");
        assert!(config.private_key_path.is_none());
        assert!(config.public_key_path.is_none());
    }

    #[test]
    fn test_token_endpoint_derived_from_issuer() {
        let config = OAuthConfig {
            issuer: "https://auth.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.token_endpoint(), "https://auth.example.com/token");
        assert_eq!(
            config.jwks_uri(),
            "https://auth.example.com/.well-known/jwks.json"
        );
    }

    #[test]
    fn test_token_endpoint_override() {
        let config = OAuthConfig {
            token_endpoint: Some("https://login.example.com/oauth2/token".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.token_endpoint(),
            "https://login.example.com/oauth2/token"
        );
    }
}
