/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - route ごとに必要な stage (認証のみ / role 必須) をここで決める
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{account, resources};
use crate::services::auth::principal::{ROLE_ADMIN, ROLE_USER};
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let pipeline = &state.pipeline;

    Router::new()
        .route("/public", get(resources::public))
        .route("/users", post(account::register))
        .route("/token", post(account::login))
        .route("/me", pipeline.authenticated(get(resources::me)))
        .route(
            "/user",
            pipeline.require_any_role(get(resources::user), [ROLE_USER]),
        )
        .route(
            "/admin",
            pipeline.require_any_role(get(resources::admin), [ROLE_ADMIN]),
        )
}
