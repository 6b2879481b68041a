use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Claim set carried by every access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    /// A single resource URI. Tokens carrying an audience array are not accepted.
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    /// Space-delimited, possibly empty
    #[serde(default)]
    pub scope: String,
}

/// Claims of a token that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedClaims {
    pub subject: String,
    pub issuer: String,
    pub audience: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub scopes: BTreeSet<String>,
}

impl ValidatedClaims {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

impl From<AccessTokenClaims> for ValidatedClaims {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            scopes: parse_scopes(&claims.scope),
            subject: claims.sub,
            issuer: claims.iss,
            audience: claims.aud,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Splits a space-delimited scope string, dropping empty tokens
pub fn parse_scopes(scope: &str) -> BTreeSet<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        let scopes = parse_scopes("files:read  email:write files:read");
        assert_eq!(scopes.len(), 2);
        assert!(scopes.contains("files:read"));
        assert!(scopes.contains("email:write"));
    }

    #[test]
    fn test_parse_empty_scope() {
        assert!(parse_scopes("").is_empty());
        assert!(parse_scopes("   ").is_empty());
    }

    #[test]
    fn test_missing_scope_claim_defaults_to_empty() {
        let claims: AccessTokenClaims = serde_json::from_value(serde_json::json!({
            "iss": "https://auth.example.com",
            "sub": "user-12345",
            "aud": "https://mcp.example.com",
            "iat": 1_700_000_000u64,
            "exp": 1_700_003_600u64,
        }))
        .unwrap();

        let validated = ValidatedClaims::from(claims);
        assert!(validated.scopes.is_empty());
        assert!(!validated.has_scope("files:read"));
    }

    #[test]
    fn test_audience_array_does_not_deserialize() {
        let result: Result<AccessTokenClaims, _> = serde_json::from_value(serde_json::json!({
            "iss": "https://auth.example.com",
            "sub": "user-12345",
            "aud": ["https://mcp.example.com", "https://other.example.com"],
            "iat": 1_700_000_000u64,
            "exp": 1_700_003_600u64,
        }));
        assert!(result.is_err());
    }
}
