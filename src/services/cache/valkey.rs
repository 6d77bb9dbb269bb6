use async_trait::async_trait;
use redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions, aio::ConnectionManager};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

/// Valkey (Redis protocol) client. `ConnectionManager` reconnects on its own.
#[derive(Clone)]
pub struct ValkeyClient {
    manager: ConnectionManager,
}

impl ValkeyClient {
    /// `url`: `redis://host:6379[/db]`
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::BackendConnection(e.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn fetch(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))
    }

    async fn insert_until(&self, key: &str, value: &str, expire_at: i64) -> CacheResult<bool> {
        let mut conn = self.manager.clone();

        // SET NX EXAT: nil reply when the key is taken.
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EXAT(expire_at.max(0) as u64));

        let reply: Option<String> = conn
            .set_options(key, value, options)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))?;

        Ok(reply.is_some())
    }
}
