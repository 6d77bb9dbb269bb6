use std::sync::Arc;

use async_trait::async_trait;

use super::{PrincipalResolver, ResolveError};
use crate::context::RequestContext;
use crate::services::auth::clock::Clock;
use crate::services::auth::principal::{Principal, TokenClaims};
use crate::services::auth::token::{self, TokenVerifier};

/// Self-contained tokens: verify → decode → expiry. No I/O.
#[derive(Clone)]
pub struct LocalTokenResolver {
    verifier: TokenVerifier,
    clock: Arc<dyn Clock>,
}

impl LocalTokenResolver {
    pub fn new(verifier: TokenVerifier, clock: Arc<dyn Clock>) -> Self {
        Self { verifier, clock }
    }

    pub fn resolve(&self, identifier: &str) -> Result<Principal, ResolveError> {
        if !self.verifier.verify(identifier)? {
            return Err(ResolveError::InvalidToken);
        }

        let claims: TokenClaims = token::decode(identifier)?;
        if !token::is_not_expired(claims.exp, self.clock.now()) {
            return Err(ResolveError::ExpiredToken);
        }

        Ok(claims.into())
    }
}

#[async_trait]
impl PrincipalResolver for LocalTokenResolver {
    async fn resolve_principal(
        &self,
        _ctx: &RequestContext,
        identifier: &str,
    ) -> Result<Principal, ResolveError> {
        self.resolve(identifier)
    }
}
