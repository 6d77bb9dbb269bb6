//! Authentication stage: identifier → Principal, or 401.
//!
//! - identifier が無い → 401 (inner は呼ばない)
//! - resolver の失敗・timeout → 401。理由 (署名不一致 / 期限切れ / backend 障害) はログにのみ残す
//! - 成功 → Principal を context に入れて inner を 1 回だけ呼ぶ

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::auth::identify;
use crate::services::auth::fingerprint::short_fingerprint;
use crate::services::auth::principal::Principal;
use crate::services::auth::resolver::{PrincipalResolver, ResolveError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no authentication in request context")]
    NoAuthentication,
}

#[derive(Debug, Clone)]
struct Authenticated(Arc<Principal>);

/// The Principal attached by the authentication stage.
///
/// Fails with `NoAuthentication` when called outside an authenticated chain.
pub fn authentication(ctx: &RequestContext) -> Result<&Principal, AuthError> {
    ctx.get::<Authenticated>()
        .map(|a| a.0.as_ref())
        .ok_or(AuthError::NoAuthentication)
}

#[derive(Clone)]
pub struct Authenticator {
    resolver: Arc<dyn PrincipalResolver>,
    resolve_timeout: Duration,
}

impl Authenticator {
    pub fn new(resolver: Arc<dyn PrincipalResolver>, resolve_timeout: Duration) -> Self {
        Self {
            resolver,
            resolve_timeout,
        }
    }
}

pub async fn authenticate(
    State(auth): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(identifier) = identify::identifier(req.extensions()).map(str::to_string) else {
        tracing::debug!("no identifier in request");
        return Err(AppError::Unauthorized);
    };

    // Dropping the request future (client gone, global timeout) also drops this resolution.
    let resolution = tokio::time::timeout(
        auth.resolve_timeout,
        auth.resolver.resolve_principal(req.extensions(), &identifier),
    )
    .await;

    let principal = match resolution {
        Ok(Ok(principal)) => principal,
        Ok(Err(err @ ResolveError::Backend(_))) => {
            tracing::error!(
                error = %err,
                identifier = %short_fingerprint(&identifier),
                "principal resolution backend failure"
            );
            return Err(AppError::Unauthorized);
        }
        Ok(Err(err)) => {
            tracing::warn!(
                error = %err,
                identifier = %short_fingerprint(&identifier),
                "authentication failed"
            );
            return Err(AppError::Unauthorized);
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = auth.resolve_timeout.as_millis() as u64,
                identifier = %short_fingerprint(&identifier),
                "principal resolution timed out"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(user_id = principal.user_id, "authenticated");
    req.extensions_mut()
        .insert(Authenticated(Arc::new(principal)));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        middleware,
        routing::get,
    };
    use tower::{ServiceBuilder, ServiceExt};

    use super::*;
    use crate::middleware::auth::identify::{IdentifyBy, identify};
    use crate::repos::error::RepoError;
    use crate::services::auth::principal::Role;
    use crate::services::cache::client::CacheError;

    struct FixedResolver;

    #[async_trait]
    impl PrincipalResolver for FixedResolver {
        async fn resolve_principal(
            &self,
            _ctx: &RequestContext,
            identifier: &str,
        ) -> Result<Principal, ResolveError> {
            match identifier {
                "good" => Ok(Principal {
                    user_id: 42,
                    login: "alice".into(),
                    roles: vec![Role::from("USER")],
                    issued_at: 0,
                    expire_at: 100,
                }),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(ResolveError::UserNotFound)
                }
                "down" => Err(RepoError::Cache(CacheError::BackendConnection(
                    "connection refused".into(),
                ))
                .into()),
                _ => Err(ResolveError::InvalidToken),
            }
        }
    }

    fn app(calls: Arc<AtomicUsize>) -> Router {
        let handler = move |req: Request| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                authentication(req.extensions())
                    .map(|p| p.user_id.to_string())
                    .unwrap_or_default()
            }
        };

        Router::new().route("/", get(handler)).layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    IdentifyBy::Header(header::AUTHORIZATION),
                    identify,
                ))
                .layer(middleware::from_fn_with_state(
                    Authenticator::new(Arc::new(FixedResolver), Duration::from_millis(50)),
                    authenticate,
                )),
        )
    }

    fn request(token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_identifier_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = app(calls.clone()).oneshot(request(None)).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_resolution_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = app(calls.clone())
            .oneshot(request(Some("bad")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_failure_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = app(calls.clone())
            .oneshot(request(Some("down")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_timeout_is_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = app(calls.clone())
            .oneshot(request(Some("slow")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolved_principal_reaches_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let res = app(calls.clone())
            .oneshot(request(Some("good")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");
    }

    #[test]
    fn accessor_outside_chain_fails() {
        assert!(matches!(
            authentication(&RequestContext::new()),
            Err(AuthError::NoAuthentication)
        ));
    }
}
