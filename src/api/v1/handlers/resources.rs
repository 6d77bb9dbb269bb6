/*
 * Responsibility
 * - 認証/認可の確認用 resource
 *   - /public: 誰でも
 *   - /me: 認証済みなら誰でも (Principal を返す)
 *   - /user, /admin: role 必須 (判定は route 側の pipeline)
 */
use axum::Json;

use crate::api::v1::extractors::CurrentPrincipal;
use crate::services::auth::principal::Principal;

pub async fn public() -> &'static str {
    "public"
}

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

pub async fn user(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    format!("user {}", principal.login)
}

pub async fn admin(CurrentPrincipal(principal): CurrentPrincipal) -> String {
    format!("admin {}", principal.login)
}
