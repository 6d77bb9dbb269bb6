//! Authorization stage: required roles vs. an injected role check, or 403.
//!
//! 具体的な Principal 型は知らない。判定は `RoleCheck` に委ねる。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::auth::authenticate::authentication;
use crate::services::auth::principal::Role;

/// Role-check capability, implemented by the embedding service.
pub trait RoleCheck: Send + Sync + 'static {
    fn has_any_role(&self, ctx: &RequestContext, roles: &[Role]) -> bool;
}

/// Default check: the authenticated Principal holds at least one of `roles`.
///
/// Exact, case-sensitive match. No authentication in context means no role.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalRoles;

impl RoleCheck for PrincipalRoles {
    fn has_any_role(&self, ctx: &RequestContext, roles: &[Role]) -> bool {
        authentication(ctx)
            .map(|principal| principal.has_any_role(roles))
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct Authorizer {
    roles: Arc<[Role]>,
    check: Arc<dyn RoleCheck>,
}

impl Authorizer {
    /// An empty `roles` set denies every request.
    pub fn new<R>(check: Arc<dyn RoleCheck>, roles: impl IntoIterator<Item = R>) -> Self
    where
        R: Into<Role>,
    {
        let roles: Arc<[Role]> = roles.into_iter().map(Into::into).collect();
        if roles.is_empty() {
            tracing::warn!("authorization stage built with no required roles; all requests will be denied");
        }

        Self { roles, check }
    }
}

pub async fn authorize(
    State(authz): State<Authorizer>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !authz.check.has_any_role(req.extensions(), &authz.roles) {
        tracing::warn!(
            required = ?authz.roles,
            path = %req.uri().path(),
            "authorization denied"
        );
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
