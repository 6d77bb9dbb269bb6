/*
 * Responsibility
 * - opaque handle の Valkey 保存 (SessionRepo 実装)
 *
 * Notes
 * - key は handle そのものではなく sha256(handle)。handle は bearer credential なので平文で置かない
 * - value は SessionRecord の JSON。expire_at で Valkey 側でも消える
 */
use std::sync::Arc;

use async_trait::async_trait;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::session_repo::{SessionRecord, SessionRepo};
use crate::services::auth::fingerprint::fingerprint;
use crate::services::cache::{CacheClient, CacheError, ValkeyClient};

const DEFAULT_PREFIX: &str = "auth:session";

pub struct ValkeySessionRepo {
    cache: Arc<dyn CacheClient>,
    prefix: String,
}

impl ValkeySessionRepo {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = ValkeyClient::connect(url).await?;
        Ok(Self::with_cache(Arc::new(client), DEFAULT_PREFIX))
    }

    pub fn with_cache(cache: Arc<dyn CacheClient>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    fn key(&self, handle: &str) -> String {
        format!("{}:{}", self.prefix, fingerprint(handle))
    }
}

#[async_trait]
impl SessionRepo for ValkeySessionRepo {
    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    async fn find(&self, handle: &str) -> RepoResult<Option<SessionRecord>> {
        match self.cache.fetch(&self.key(handle)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, handle: &str, record: &SessionRecord) -> RepoResult<()> {
        let value = serde_json::to_string(record)?;

        if self
            .cache
            .insert_until(&self.key(handle), &value, record.expire_at)
            .await?
        {
            Ok(())
        } else {
            Err(RepoError::Conflict)
        }
    }
}
