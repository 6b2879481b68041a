//! Audience-bound access tokens
//!
//! The authorization server side mints RS256 JWTs whose `aud` is exactly the resource the
//! client asked for (RFC 8707). The resource server side accepts a token only when its
//! signature, issuer, audience and expiry all check out against local configuration.

pub mod claims;
pub mod issuer;
pub mod validator;

pub use claims::{AccessTokenClaims, ValidatedClaims};
pub use issuer::{GrantAsRequested, IssuancePolicy, IssueError, IssuedToken, TokenIssuer};
pub use validator::{TokenValidator, ValidationError};
