use crate::config::ResourceConfig;
use crate::keys::KeyMaterial;
use crate::oauth::claims::{AccessTokenClaims, ValidatedClaims};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use log::debug;
use std::sync::Arc;
use thiserror::Error;

/// Reasons a presented access token is not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Signature has expired")]
    Expired,
    #[error("Invalid issuer")]
    IssuerMismatch,
    #[error("Invalid audience")]
    AudienceMismatch,
    #[error("{0}")]
    BadSignature(&'static str),
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => Self::IssuerMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => Self::AudienceMismatch,
            ErrorKind::MissingRequiredClaim(_) => Self::BadSignature("Missing required claim"),
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                Self::BadSignature("The specified alg is not allowed")
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Self::BadSignature("Malformed token"),
            _ => Self::BadSignature("Signature verification failed"),
        }
    }
}

/// Verifies access tokens presented to one resource server
#[derive(Clone)]
pub struct TokenValidator {
    keys: Arc<KeyMaterial>,
    validation: Validation,
}

impl TokenValidator {
    /// Accepts RS256 tokens from `trusted_issuer` whose audience is exactly `audience`
    pub fn new(keys: Arc<KeyMaterial>, trusted_issuer: &str, audience: &str, leeway: u64) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[trusted_issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = leeway;

        Self { keys, validation }
    }

    pub fn from_config(keys: Arc<KeyMaterial>, config: &ResourceConfig) -> Self {
        Self::new(keys, &config.trusted_issuer, &config.uri, config.leeway)
    }

    pub fn validate(&self, token: &str) -> Result<ValidatedClaims, ValidationError> {
        let data = decode::<AccessTokenClaims>(token, self.keys.decoding_key(), &self.validation)?;
        let claims = ValidatedClaims::from(data.claims);

        debug!(
            "Validated token for subject '{}' with {} scopes",
            claims.subject,
            claims.scopes.len()
        );
        Ok(claims)
    }
}
