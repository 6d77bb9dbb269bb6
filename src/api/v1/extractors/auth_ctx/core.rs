use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::middleware::auth::authentication;
use crate::services::auth::principal::Principal;

/// Handler で Principal を受け取るための extractor
///
/// Authentication stage が context に Principal を入れている前提。
/// 見つからない場合は route の組み立てミスなので、error ログを出して 500 を返す。
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match authentication(&parts.extensions) {
            Ok(principal) => Ok(CurrentPrincipal(principal.clone())),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %parts.uri.path(),
                    "handler requires an authenticated route"
                );
                Err(AppError::Internal)
            }
        }
    }
}
