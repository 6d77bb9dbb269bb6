//! Key/value store seen by the session layer.
use async_trait::async_trait;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Transport vs. command failures. Both end as a failed lookup (401) upstream.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// String values with an absolute expiry.
///
/// Entries are write-once: a key is never overwritten while it is alive.
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    async fn fetch(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` until `expire_at` (epoch seconds).
    ///
    /// `Ok(false)` when a live entry already holds the key.
    async fn insert_until(&self, key: &str, value: &str, expire_at: i64) -> CacheResult<bool>;
}
