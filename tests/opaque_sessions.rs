//! Opaque handles resolved through the in-memory session store.

mod common;

use std::sync::Arc;

use axum::{Router, http::StatusCode};
use serde_json::json;

use common::{app, clock, get, json, post_json};
use tollgate::repos::session_repo::{MemorySessionRepo, SessionRecord, SessionRepo};
use tollgate::services::auth::{account::CredentialIssuer, resolver::StoredSessionResolver};

fn opaque_app(sessions: Arc<dyn SessionRepo>, now: i64) -> Router {
    app(
        Arc::new(StoredSessionResolver::new(sessions.clone(), clock(now))),
        CredentialIssuer::Opaque {
            sessions,
            ttl_seconds: 600,
            clock: clock(now),
        },
    )
}

#[tokio::test]
async fn stored_handle_resolves_until_expiry() {
    let sessions: Arc<dyn SessionRepo> = Arc::new(MemorySessionRepo::new());
    sessions
        .insert(
            "handle-1",
            &SessionRecord {
                user_id: 1,
                login: "alice".into(),
                roles: vec!["ADMIN".into()],
                issued_at: 1000,
                expire_at: 1600,
            },
        )
        .await
        .unwrap();

    let app = opaque_app(sessions.clone(), 1200);
    let (status, body) = get(&app, "/api/v1/admin", Some("handle-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"admin alice");

    let app = opaque_app(sessions, 1700);
    let (status, _) = get(&app, "/api/v1/admin", Some("handle-1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_handle_is_unauthorized() {
    let app = opaque_app(Arc::new(MemorySessionRepo::new()), 1200);
    assert_eq!(
        get(&app, "/api/v1/me", Some("nope")).await.0,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn registration_issues_a_stored_handle() {
    let app = opaque_app(Arc::new(MemorySessionRepo::new()), 1200);

    let (status, body) = post_json(
        &app,
        "/api/v1/users",
        json!({"login": "dave", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let handle = json(&body)["token"].as_str().unwrap().to_string();

    let (status, body) = get(&app, "/api/v1/me", Some(&handle)).await;
    assert_eq!(status, StatusCode::OK);
    let me = json(&body);
    assert_eq!(me["login"], "dave");
    assert_eq!(me["roles"], json!(["USER"]));
    assert_eq!(me["issuedAt"], 1200);
    assert_eq!(me["expireAt"], 1800);
}
