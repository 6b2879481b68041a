use confique::Config;

/// Resource server configuration
#[derive(Debug, Config, Clone)]
pub struct ResourceConfig {
    /// Canonical URI of this resource server, the only accepted audience
    /// (default: https://mcp.example.com)
    #[config(env = "GUARD_RESOURCE_URI", default = "https://mcp.example.com")]
    pub uri: String,

    /// Realm named in `WWW-Authenticate` challenges (default: mcp.example.com)
    #[config(env = "GUARD_RESOURCE_REALM", default = "mcp.example.com")]
    pub realm: String,

    /// Issuer whose tokens are accepted (default: https://auth.example.com)
    #[config(
        env = "GUARD_RESOURCE_TRUSTED_ISSUER",
        default = "https://auth.example.com"
    )]
    pub trusted_issuer: String,

    /// Clock skew tolerance for expiry checks in seconds (default: 0)
    #[config(env = "GUARD_RESOURCE_LEEWAY", default = 0)]
    pub leeway: u64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            uri: "https://mcp.example.com".to_string(),
            realm: "mcp.example.com".to_string(),
            trusted_issuer: "https://auth.example.com".to_string(),
            leeway: 0,
        }
    }
}
