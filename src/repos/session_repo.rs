/*
 * Responsibility
 * - opaque bearer handle → profile + roles の保存先
 * - stateful resolver が参照する
 *
 * Notes
 * - 実装: Postgres (tokens JOIN users), in-memory, Valkey (valkey_session_repo)
 * - 再試行はしない。transport 側の責務。
 */
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::principal::{Principal, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: i64,
    pub login: String,
    pub roles: Vec<Role>,
    pub issued_at: i64,
    pub expire_at: i64,
}

impl From<SessionRecord> for Principal {
    fn from(record: SessionRecord) -> Self {
        Self {
            user_id: record.user_id,
            login: record.login,
            roles: record.roles,
            issued_at: record.issued_at,
            expire_at: record.expire_at,
        }
    }
}

#[async_trait]
pub trait SessionRepo: Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    async fn find(&self, handle: &str) -> RepoResult<Option<SessionRecord>>;

    // Conflict if the handle already exists.
    async fn insert(&self, handle: &str, record: &SessionRecord) -> RepoResult<()>;
}

#[derive(Debug, FromRow)]
struct SessionRow {
    user_id: i64,
    login: String,
    roles: Vec<String>,
    issued_at: i64,
    expire_at: i64,
}

#[derive(Clone, Debug)]
pub struct PgSessionRepo {
    db: PgPool,
}

impl PgSessionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepo for PgSessionRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find(&self, handle: &str) -> RepoResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT u.id AS user_id, u.login, u.roles, t.issued_at, t.expire_at
            FROM tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.id = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|r| SessionRecord {
            user_id: r.user_id,
            login: r.login,
            roles: r.roles.into_iter().map(Role::from).collect(),
            issued_at: r.issued_at,
            expire_at: r.expire_at,
        }))
    }

    async fn insert(&self, handle: &str, record: &SessionRecord) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, user_id, issued_at, expire_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(handle)
        .bind(record.user_id)
        .bind(record.issued_at)
        .bind(record.expire_at)
        .execute(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(())
    }
}

/// Process-local store for development and tests.
#[derive(Debug, Default)]
pub struct MemorySessionRepo {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepo for MemorySessionRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, handle: &str) -> RepoResult<Option<SessionRecord>> {
        Ok(self.sessions.read().await.get(handle).cloned())
    }

    async fn insert(&self, handle: &str, record: &SessionRecord) -> RepoResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(handle) {
            return Err(RepoError::Conflict);
        }
        sessions.insert(handle.to_string(), record.clone());
        Ok(())
    }
}
