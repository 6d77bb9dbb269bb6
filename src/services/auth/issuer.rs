use std::sync::Arc;

use crate::services::auth::clock::Clock;
use crate::services::auth::principal::{Role, TokenClaims};
use crate::services::auth::token::{TokenError, TokenSigner};

/// Stamps `iat`/`exp` and signs the claims with the configured scheme.
#[derive(Clone)]
pub struct TokenIssuer {
    signer: TokenSigner,
    ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(signer: TokenSigner, ttl_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            signer,
            ttl_seconds,
            clock,
        }
    }

    pub fn issue(&self, user_id: i64, login: &str, roles: Vec<Role>) -> Result<String, TokenError> {
        let now = self.clock.now();
        let exp = now
            .checked_add(self.ttl_seconds)
            .ok_or(TokenError::ExpiryOverflow)?;
        let claims = TokenClaims {
            user_id,
            login: login.to_string(),
            roles,
            iat: now,
            exp,
        };

        self.signer.encode(&claims)
    }
}
