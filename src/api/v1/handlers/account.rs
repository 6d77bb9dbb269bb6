/*
 * Responsibility
 * - POST /users (register), POST /token (login)
 * - credential の発行は AccountService に任せる
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::api::v1::dto::account::{CredentialsRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let token = state.accounts.register(&req.login, &req.password).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.accounts.login(&req.login, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}
