/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

use crate::services::cache::CacheError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("stored value error: {0}")]
    Value(#[from] serde_json::Error),
    #[error("conflict")]
    Conflict,
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    /// unique violation (23505) は Conflict として上に伝える
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict;
        }
        RepoError::Db(e)
    }
}
