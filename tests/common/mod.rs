#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderName, Request, StatusCode},
};
use tower::ServiceExt;

use tollgate::api;
use tollgate::middleware::{
    Pipeline,
    auth::{IdentifyBy, PrincipalRoles},
};
use tollgate::repos::user_repo::MemoryUserRepo;
use tollgate::services::auth::{
    AccountService, PrincipalResolver, account::CredentialIssuer, clock::FixedClock,
};
use tollgate::state::AppState;

pub const TOKEN_HEADER: &str = "x-auth-token";

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

pub fn clock(now: i64) -> Arc<FixedClock> {
    Arc::new(FixedClock(now))
}

/// v1 routes backed by in-memory users and the given resolver / credential issuer.
pub fn app(resolver: Arc<dyn PrincipalResolver>, credentials: CredentialIssuer) -> Router {
    let accounts = Arc::new(AccountService::new(
        Arc::new(MemoryUserRepo::new()),
        credentials,
    ));
    let pipeline = Pipeline::new(
        IdentifyBy::Header(HeaderName::from_static(TOKEN_HEADER)),
        resolver,
        Arc::new(PrincipalRoles),
        Duration::from_secs(2),
    );
    let state = AppState::new(accounts, pipeline);

    Router::new()
        .nest("/api/v1", api::v1::routes(&state))
        .with_state(state)
}

pub async fn get(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().uri(path);
    if let Some(token) = token {
        req = req.header(TOKEN_HEADER, token);
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    path: &str,
    json: serde_json::Value,
) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    send(app, req).await
}

pub fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}
