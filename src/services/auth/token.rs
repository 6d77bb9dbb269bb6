//! Compact signed token codec.
//!
//! Wire format: `base64url(header).base64url(payload).base64url(signature)` (no padding).
//!
//! - `header` は scheme ごとに固定。token 側の `alg` は一切参照しない。
//! - `decode` は署名を検証しない。claims を読むことと信頼することは別の操作。
//! - 署名 primitive (HMAC-SHA256 / RSA-PKCS1v15-SHA256) は jsonwebtoken に任せる。
use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: expected 3 segments, got {0}")]
    Malformed(usize),
    #[error("token segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key material: {0}")]
    Key(#[source] jsonwebtoken::errors::Error),
    #[error("signing failed: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime overflows the expiry timestamp")]
    ExpiryOverflow,
}

/// Signing scheme. Selected by configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Hs256,
    Rs256,
}

impl Scheme {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Rs256 => "RS256",
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Rs256 => Algorithm::RS256,
        }
    }

    fn header(self) -> Header {
        Header {
            alg: self.name(),
            typ: "JWT",
        }
    }
}

// Field order is part of the wire format: {"alg":..,"typ":"JWT"}
#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

/// Issues tokens with a shared secret (HS256) or an RSA private key (RS256).
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenSigner {
    scheme: Scheme,
    key: EncodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl TokenSigner {
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            scheme: Scheme::Hs256,
            key: EncodingKey::from_secret(secret),
        }
    }

    /// `private_key_pem` is a PKCS#1 or PKCS#8 RSA private key.
    pub fn rs256_pem(private_key_pem: &[u8]) -> Result<Self, TokenError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem).map_err(TokenError::Key)?;
        Ok(Self {
            scheme: Scheme::Rs256,
            key,
        })
    }

    pub fn encode<T: Serialize>(&self, payload: &T) -> Result<String, TokenError> {
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&self.scheme.header())?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
        let signing_input = format!("{header}.{payload}");

        // crypto::sign returns the signature already base64url encoded (no padding)
        let signature = jsonwebtoken::crypto::sign(
            signing_input.as_bytes(),
            &self.key,
            self.scheme.algorithm(),
        )
        .map_err(TokenError::Sign)?;

        Ok(format!("{signing_input}.{signature}"))
    }
}

/// Verifies tokens with the shared secret (HS256) or the RSA public key (RS256).
#[derive(Clone)]
pub struct TokenVerifier {
    scheme: Scheme,
    key: DecodingKey,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl TokenVerifier {
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            scheme: Scheme::Hs256,
            key: DecodingKey::from_secret(secret),
        }
    }

    /// `public_key_pem` is an SPKI (`BEGIN PUBLIC KEY`) or PKCS#1 RSA public key.
    pub fn rs256_pem(public_key_pem: &[u8]) -> Result<Self, TokenError> {
        let key = DecodingKey::from_rsa_pem(public_key_pem).map_err(TokenError::Key)?;
        Ok(Self {
            scheme: Scheme::Rs256,
            key,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Recompute the signature over the first two segments and compare.
    ///
    /// Returns `Ok(false)` on mismatch. Errors only for a malformed token or
    /// key material that does not fit the configured scheme.
    pub fn verify(&self, token: &str) -> Result<bool, TokenError> {
        let [header, payload, signature] = split(token)?;
        URL_SAFE_NO_PAD.decode(signature)?;

        let signing_input = format!("{header}.{payload}");
        jsonwebtoken::crypto::verify(
            signature,
            signing_input.as_bytes(),
            &self.key,
            self.scheme.algorithm(),
        )
        .map_err(TokenError::Key)
    }
}

/// Read the payload segment without verifying it.
pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
    let [_, payload, _] = split(token)?;
    let json = URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Strict: a token whose `exp` equals the reference time is already expired.
pub fn is_not_expired(exp: i64, reference: i64) -> bool {
    reference < exp
}

fn split(token: &str) -> Result<[&str; 3], TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    <[&str; 3]>::try_from(parts).map_err(|parts| TokenError::Malformed(parts.len()))
}
