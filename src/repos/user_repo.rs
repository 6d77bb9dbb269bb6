/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (login 検索 / 登録)
 * - DB エラーは RepoError に変換しやすい形で返す
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::principal::Role;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl UserRow {
    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().map(|r| Role::from(r.as_str())).collect()
    }
}

#[async_trait]
pub trait UserRepo: Send + Sync + 'static {
    async fn find_by_login(&self, login: &str) -> RepoResult<Option<UserRow>>;

    // Conflict if the login is taken.
    async fn create(&self, login: &str, password_hash: &str, roles: &[Role])
    -> RepoResult<UserRow>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_login(&self, login: &str) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, login, password_hash, roles
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn create(
        &self,
        login: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> RepoResult<UserRow> {
        let roles: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (login, password_hash, roles)
            VALUES ($1, $2, $3)
            RETURNING id, login, password_hash, roles
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .bind(roles)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }
}

/// Process-local user table for development and tests.
#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    users: RwLock<Vec<UserRow>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_login(&self, login: &str) -> RepoResult<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn create(
        &self,
        login: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> RepoResult<UserRow> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.login == login) {
            return Err(RepoError::Conflict);
        }

        let row = UserRow {
            id: users.len() as i64 + 1,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        };
        users.push(row.clone());
        Ok(row)
    }
}
