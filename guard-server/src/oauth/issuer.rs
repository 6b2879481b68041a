use crate::config::OAuthConfig;
use crate::keys::KeyMaterial;
use crate::oauth::claims::{parse_scopes, AccessTokenClaims};

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, Header};
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

/// Media type for JWT access tokens (RFC 9068)
const ACCESS_TOKEN_TYPE: &str = "at+jwt";

/// Errors that can occur while issuing an access token
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("resource parameter is required")]
    MissingResource,
    #[error("Requested scope rejected: {0}")]
    ScopeRejected(String),
    #[error("Token lifetime of {0}s overflows the expiry timestamp")]
    ExpiryOverflow(u64),
    #[error("Failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Decides which scopes a subject is granted for a resource
pub trait IssuancePolicy: Send + Sync {
    /// Returns the space-delimited scope string to embed in the token
    fn grant(
        &self,
        subject: &str,
        resource: &str,
        requested_scope: &str,
    ) -> Result<String, IssueError>;
}

/// Grants exactly what was requested
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAsRequested;

impl IssuancePolicy for GrantAsRequested {
    fn grant(
        &self,
        _subject: &str,
        _resource: &str,
        requested_scope: &str,
    ) -> Result<String, IssueError> {
        Ok(requested_scope.to_string())
    }
}

/// A freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
    pub scope: String,
    pub audience: String,
}

/// Mints access tokens bound to a single resource
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
    issuer: String,
    subject: String,
    ttl: u64,
    policy: Arc<dyn IssuancePolicy>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<KeyMaterial>, config: &OAuthConfig) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            subject: config.subject.clone(),
            ttl: config.token_ttl,
            policy: Arc::new(GrantAsRequested),
        }
    }

    /// Replaces the issuance policy
    pub fn with_policy(mut self, policy: Arc<dyn IssuancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issues a token for `resource` with the current time as issued-at
    pub fn issue(
        &self,
        resource: Option<&str>,
        scope: Option<&str>,
    ) -> Result<IssuedToken, IssueError> {
        self.issue_at(resource, scope, get_current_timestamp())
    }

    /// Issues a token for `resource` as if the current time were `now`
    pub fn issue_at(
        &self,
        resource: Option<&str>,
        scope: Option<&str>,
        now: u64,
    ) -> Result<IssuedToken, IssueError> {
        let resource = match resource {
            Some(resource) if !resource.trim().is_empty() => resource,
            _ => return Err(IssueError::MissingResource),
        };

        let granted = self
            .policy
            .grant(&self.subject, resource, scope.unwrap_or_default())?;

        let exp = now
            .checked_add(self.ttl)
            .ok_or(IssueError::ExpiryOverflow(self.ttl))?;

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            aud: resource.to_string(),
            iat: now,
            exp,
            scope: granted,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some(ACCESS_TOKEN_TYPE.to_string());
        header.kid = Some(self.keys.key_id().to_string());

        let access_token = encode(&header, &claims, self.keys.encoding_key())?;

        info!(
            "Issued access token for subject '{}' with audience '{}'",
            claims.sub, claims.aud
        );
        debug!(
            "Token for '{}' carries {} scopes, expires in {}s",
            claims.aud,
            parse_scopes(&claims.scope).len(),
            self.ttl
        );

        Ok(IssuedToken {
            access_token,
            expires_in: self.ttl,
            scope: claims.scope,
            audience: claims.aud,
        })
    }
}
