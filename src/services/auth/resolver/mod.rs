/*
 * Responsibility
 * - identifier (bearer string / peer address 等) → Principal の解決
 * - Authentication middleware はこの trait だけを知る
 *
 * Notes
 * - InvalidToken / ExpiredToken は内部では区別するが、外には同じ 401 として見せる
 * - Backend (storage/network) の原因はサーバ側ログにのみ残す
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::context::RequestContext;
use crate::repos::error::RepoError;
use crate::services::auth::principal::Principal;
use crate::services::auth::token::TokenError;

mod local;
mod stored;

pub use local::LocalTokenResolver;
pub use stored::StoredSessionResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid token signature")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("user not found")]
    UserNotFound,
    #[error("resolution backend failure: {0}")]
    Backend(#[from] RepoError),
}

/// User lookup capability injected into the authentication stage.
#[async_trait]
pub trait PrincipalResolver: Send + Sync + 'static {
    async fn resolve_principal(
        &self,
        ctx: &RequestContext,
        identifier: &str,
    ) -> Result<Principal, ResolveError>;
}
