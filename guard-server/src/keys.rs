//! RSA key material shared by the token issuer and validator

use crate::config::OAuthConfig;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use log::{info, warn};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use utoipa::ToSchema;

const GENERATED_KEY_BITS: usize = 2048;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to read key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Public key does not belong to the private key")]
    Mismatch,
    #[error("Failed to generate key pair: {0}")]
    Generation(#[from] rsa::Error),
}

/// Public verification key as an RFC 7517 JSON Web Key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub kid: String,
    pub n: String,
    pub e: String,
}

/// RS256 signing key pair plus its derived key id and JWK
#[derive(Clone)]
pub struct KeyMaterial {
    encoding: EncodingKey,
    decoding: DecodingKey,
    jwk: Jwk,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kid", &self.jwk.kid)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Parses a PEM private key (PKCS#8 or PKCS#1) and a PEM public key (SPKI or PKCS#1)
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| KeyError::InvalidKey(format!("private key: {e}")))?;
        let public = RsaPublicKey::from_public_key_pem(public_pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(public_pem))
            .map_err(|e| KeyError::InvalidKey(format!("public key: {e}")))?;

        if RsaPublicKey::from(&private) != public {
            return Err(KeyError::Mismatch);
        }

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(format!("public key: {e}")))?;

        Ok(Self {
            encoding,
            decoding,
            jwk: jwk_for(&public),
        })
    }

    /// Reads both PEM files and delegates to [`KeyMaterial::from_pem`]
    pub fn from_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, KeyError> {
        let private_pem = read_pem(private_path.as_ref())?;
        let public_pem = read_pem(public_path.as_ref())?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Generates an ephemeral key pair that lives only as long as the process
    pub fn generate() -> Result<Self, KeyError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), GENERATED_KEY_BITS)?;
        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let public_pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        let keys = Self::from_pem(&private_pem, &public_pem)?;
        info!("Generated ephemeral RSA key pair with kid {}", keys.key_id());
        Ok(keys)
    }

    /// Loads the configured key files, or generates an ephemeral pair when none are set
    pub fn from_config(config: &OAuthConfig) -> Result<Self, KeyError> {
        match (&config.private_key_path, &config.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                let keys = Self::from_files(private_path, public_path)?;
                info!("Loaded RSA key pair with kid {}", keys.key_id());
                Ok(keys)
            }
            (None, None) => {
                warn!("No signing key configured, issued tokens will not survive a restart");
                Self::generate()
            }
            _ => Err(KeyError::InvalidKey(
                "private and public key paths must be configured together".to_string(),
            )),
        }
    }

    /// RFC 7638 thumbprint of the public key
    pub fn key_id(&self) -> &str {
        &self.jwk.kid
    }

    pub fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

fn read_pem(path: &Path) -> Result<String, KeyError> {
    std::fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn jwk_for(public: &RsaPublicKey) -> Jwk {
    let n = URL_SAFE_NO_PAD.encode(public.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public.e().to_bytes_be());

    // Members in lexicographic order with no whitespace
    let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
    let kid = URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()));

    Jwk {
        kty: "RSA".to_string(),
        key_use: "sig".to_string(),
        alg: "RS256".to_string(),
        kid,
        n,
        e,
    }
}
