use crate::oauth::{TokenValidator, ValidationError};

use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use log::warn;
use std::collections::BTreeSet;

/// The caller a request was admitted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub scopes: BTreeSet<String>,
}

impl Principal {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

/// A denied request, carrying everything needed to render the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub error: &'static str,
    pub description: String,
    /// Value of the `WWW-Authenticate` header
    pub challenge: String,
}

impl Rejection {
    pub fn missing_credential(realm: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "missing_or_malformed_credential",
            description: "Missing or invalid Authorization header".to_string(),
            challenge: challenge(realm, &[]),
        }
    }

    pub fn invalid_token(realm: &str, err: &ValidationError) -> Self {
        match err {
            ValidationError::AudienceMismatch => Self {
                status: StatusCode::UNAUTHORIZED,
                error: "invalid_token",
                description: "Invalid audience. Token is not intended for this server."
                    .to_string(),
                challenge: challenge(
                    realm,
                    &[
                        ("error", "invalid_token"),
                        ("error_description", "Invalid audience"),
                    ],
                ),
            },
            other => {
                let reason = other.to_string();
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    error: "invalid_token",
                    description: format!("Token validation failed: {reason}"),
                    challenge: challenge(
                        realm,
                        &[("error", "invalid_token"), ("error_description", reason.as_str())],
                    ),
                }
            }
        }
    }

    pub fn insufficient_scope(realm: &str, scope: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: "insufficient_scope",
            description: format!("Missing required scope: {scope}"),
            challenge: challenge(
                realm,
                &[("error", "insufficient_scope"), ("scope", scope)],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Admitted(Principal),
    Rejected(Rejection),
}

impl AuthorizationDecision {
    pub fn into_result(self) -> Result<Principal, Rejection> {
        match self {
            Self::Admitted(principal) => Ok(principal),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

/// Decides whether a request may reach a protected handler
#[derive(Clone)]
pub struct AuthorizationGate {
    validator: TokenValidator,
    realm: String,
}

impl AuthorizationGate {
    pub fn new(validator: TokenValidator, realm: impl Into<String>) -> Self {
        Self {
            validator,
            realm: realm.into(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Authorizes a request from its headers
    pub fn authorize_headers(
        &self,
        headers: &HeaderMap,
        required_scope: Option<&str>,
    ) -> AuthorizationDecision {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.authorize(authorization, required_scope)
    }

    /// Validates the bearer credential, then checks `required_scope` if one is given
    pub fn authorize(
        &self,
        authorization: Option<&str>,
        required_scope: Option<&str>,
    ) -> AuthorizationDecision {
        let Some(token) = authorization.and_then(parse_bearer) else {
            warn!("Rejected request: missing or malformed Authorization header");
            return AuthorizationDecision::Rejected(Rejection::missing_credential(&self.realm));
        };

        let claims = match self.validator.validate(token) {
            Ok(claims) => claims,
            Err(err) => {
                warn!("Rejected request: {}", err);
                return AuthorizationDecision::Rejected(Rejection::invalid_token(
                    &self.realm,
                    &err,
                ));
            }
        };

        let principal = Principal {
            subject: claims.subject,
            scopes: claims.scopes,
        };

        if let Some(scope) = required_scope {
            if !principal.has_scope(scope) {
                warn!(
                    "Rejected request from '{}': missing scope '{}'",
                    principal.subject, scope
                );
                return AuthorizationDecision::Rejected(Rejection::insufficient_scope(
                    &self.realm,
                    scope,
                ));
            }
        }

        AuthorizationDecision::Admitted(principal)
    }
}

/// Extracts the token from `Bearer <token>`. The scheme is case-insensitive.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token)
}

fn challenge(realm: &str, params: &[(&str, &str)]) -> String {
    let mut value = format!(r#"Bearer realm="{}""#, quoted(realm));
    for (name, param) in params {
        value.push_str(&format!(r#", {}="{}""#, name, quoted(param)));
    }
    value
}

/// Drops characters that would break out of a quoted-string
fn quoted(value: &str) -> String {
    value.chars().filter(|c| *c != '"' && *c != '\\').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthConfig;
    use crate::keys::tests::test_keys;
    use crate::oauth::TokenIssuer;
    use http::HeaderValue;
    use jsonwebtoken::get_current_timestamp;
    use std::sync::Arc;

    const RESOURCE: &str = "https://mcp.example.com";
    const REALM: &str = "mcp.example.com";

    fn gate() -> AuthorizationGate {
        let validator = TokenValidator::new(
            Arc::new(test_keys()),
            "https://auth.example.com",
            RESOURCE,
            0,
        );
        AuthorizationGate::new(validator, REALM)
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Arc::new(test_keys()), &OAuthConfig::default())
    }

    fn bearer(resource: &str, scope: &str) -> String {
        let token = issuer()
            .issue(Some(resource), Some(scope))
            .unwrap()
            .access_token;
        format!("Bearer {token}")
    }

    fn rejected(decision: AuthorizationDecision) -> Rejection {
        decision.into_result().unwrap_err()
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("BEARER   abc  "), Some("abc"));
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("Bearer abc def"), None);
        assert_eq!(parse_bearer(""), None);
    }

    #[test]
    fn test_admits_valid_token_without_required_scope() {
        let header = bearer(RESOURCE, "files:read email:write");
        let principal = gate().authorize(Some(header.as_str()), None).into_result().unwrap();

        assert_eq!(principal.subject, "user-12345");
        assert_eq!(principal.scopes.len(), 2);
    }

    #[test]
    fn test_admits_with_required_scope() {
        let header = bearer(RESOURCE, "files:read");
        let decision = gate().authorize(Some(header.as_str()), Some("files:read"));
        assert!(matches!(decision, AuthorizationDecision::Admitted(_)));
    }

    #[test]
    fn test_missing_credential() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer")] {
            let rejection = rejected(gate().authorize(header, None));
            assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
            assert_eq!(rejection.error, "missing_or_malformed_credential");
            assert_eq!(rejection.challenge, r#"Bearer realm="mcp.example.com""#);
        }
    }

    #[test]
    fn test_audience_mismatch_is_distinguished() {
        let header = bearer("https://evil.example.com", "files:read");
        let rejection = rejected(gate().authorize(Some(header.as_str()), None));

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error, "invalid_token");
        assert_eq!(
            rejection.description,
            "Invalid audience. Token is not intended for this server."
        );
        assert_eq!(
            rejection.challenge,
            r#"Bearer realm="mcp.example.com", error="invalid_token", error_description="Invalid audience""#
        );
    }

    #[test]
    fn test_expired_token_is_generic_invalid_token() {
        let token = issuer()
            .issue_at(Some(RESOURCE), Some("files:read"), get_current_timestamp() - 7200)
            .unwrap()
            .access_token;
        let header = format!("Bearer {token}");
        let rejection = rejected(gate().authorize(Some(header.as_str()), Some("files:read")));

        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejection.error, "invalid_token");
        assert_eq!(
            rejection.description,
            "Token validation failed: Signature has expired"
        );
        assert!(rejection
            .challenge
            .ends_with(r#"error_description="Signature has expired""#));
    }

    #[test]
    fn test_validation_runs_before_scope_check() {
        let header = bearer("https://evil.example.com", "");
        let rejection = rejected(gate().authorize(Some(header.as_str()), Some("files:delete")));
        assert_eq!(rejection.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_insufficient_scope() {
        let header = bearer(RESOURCE, "files:read");
        let rejection = rejected(gate().authorize(Some(header.as_str()), Some("files:delete")));

        assert_eq!(rejection.status, StatusCode::FORBIDDEN);
        assert_eq!(rejection.error, "insufficient_scope");
        assert_eq!(rejection.description, "Missing required scope: files:delete");
        assert_eq!(
            rejection.challenge,
            r#"Bearer realm="mcp.example.com", error="insufficient_scope", scope="files:delete""#
        );
    }

    #[test]
    fn test_authorize_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer(RESOURCE, "email:write")).unwrap(),
        );
        let decision = gate().authorize_headers(&headers, Some("email:write"));
        assert!(matches!(decision, AuthorizationDecision::Admitted(_)));

        let decision = gate().authorize_headers(&HeaderMap::new(), None);
        assert_eq!(
            rejected(decision).error,
            "missing_or_malformed_credential"
        );
    }

    #[test]
    fn test_challenge_strips_quotes() {
        assert_eq!(
            challenge("a\"b", &[("error_description", r#"bad "thing" \ here"#)]),
            r#"Bearer realm="ab", error_description="bad thing  here""#
        );
    }
}
