/*
 * Responsibility
 * - register / login (password 検証) と credential の発行
 * - credential は署名付き token か、opaque handle (session store に保存) のどちらか
 *
 * Notes
 * - password hash は argon2 (PHC string)。計算は blocking pool で行う。
 */
use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::repos::session_repo::{SessionRecord, SessionRepo};
use crate::repos::user_repo::{UserRepo, UserRow};
use crate::services::auth::clock::Clock;
use crate::services::auth::issuer::TokenIssuer;
use crate::services::auth::principal::{ROLE_USER, Role};
use crate::services::auth::token::TokenError;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("login already taken")]
    LoginTaken,
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<RepoError> for AccountError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AccountError::LoginTaken,
            other => AccountError::Repo(other),
        }
    }
}

/// How a successful login is turned into a bearer credential.
#[derive(Clone)]
pub enum CredentialIssuer {
    Signed(TokenIssuer),
    Opaque {
        sessions: Arc<dyn SessionRepo>,
        ttl_seconds: i64,
        clock: Arc<dyn Clock>,
    },
}

impl CredentialIssuer {
    pub async fn issue(&self, user: &UserRow) -> Result<String, AccountError> {
        match self {
            Self::Signed(issuer) => Ok(issuer.issue(user.id, &user.login, user.roles())?),
            Self::Opaque {
                sessions,
                ttl_seconds,
                clock,
            } => {
                let handle = Uuid::new_v4().to_string();
                let now = clock.now();
                let expire_at = now
                    .checked_add(*ttl_seconds)
                    .ok_or(TokenError::ExpiryOverflow)?;
                let record = SessionRecord {
                    user_id: user.id,
                    login: user.login.clone(),
                    roles: user.roles(),
                    issued_at: now,
                    expire_at,
                };
                sessions
                    .insert(&handle, &record)
                    .await
                    .map_err(AccountError::Repo)?;
                Ok(handle)
            }
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepo>,
    credentials: CredentialIssuer,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, credentials: CredentialIssuer) -> Self {
        Self { users, credentials }
    }

    /// New accounts get the `USER` role.
    pub async fn register(&self, login: &str, password: &str) -> Result<String, AccountError> {
        validate(login, password)?;

        let hash = run_blocking({
            let password = password.to_string();
            move || hash_password(&password)
        })
        .await?;

        let user = self
            .users
            .create(login, &hash, &[Role::from(ROLE_USER)])
            .await?;
        tracing::info!(user_id = user.id, login = %user.login, "user registered");

        self.credentials.issue(&user).await
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<String, AccountError> {
        validate(login, password)?;

        let user = self
            .users
            .find_by_login(login)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let ok = run_blocking({
            let password = password.to_string();
            let hash = user.password_hash.clone();
            move || Ok(verify_password(&hash, &password))
        })
        .await?;
        if !ok {
            return Err(AccountError::InvalidCredentials);
        }

        self.credentials.issue(&user).await
    }
}

fn validate(login: &str, password: &str) -> Result<(), AccountError> {
    if login.trim().is_empty() {
        return Err(AccountError::Validation("login is required"));
    }
    if password.is_empty() {
        return Err(AccountError::Validation("password is required"));
    }
    Ok(())
}

async fn run_blocking<T, F>(f: F) -> Result<T, AccountError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AccountError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AccountError::PasswordHash(e.to_string()))?
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes).map_err(|e| AccountError::PasswordHash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AccountError::PasswordHash(e.to_string()))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::session_repo::MemorySessionRepo;
    use crate::repos::user_repo::MemoryUserRepo;
    use crate::services::auth::clock::FixedClock;
    use crate::services::auth::principal::TokenClaims;
    use crate::services::auth::token::{self, TokenSigner};

    fn signed_service() -> AccountService {
        let issuer = TokenIssuer::new(TokenSigner::hs256(b"k"), 600, Arc::new(FixedClock(1000)));
        AccountService::new(
            Arc::new(MemoryUserRepo::new()),
            CredentialIssuer::Signed(issuer),
        )
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "wrong"));
        assert!(!verify_password("not-a-phc-string", "s3cret"));
    }

    #[tokio::test]
    async fn register_then_login_issues_user_tokens() {
        let accounts = signed_service();
        let registered = accounts.register("alice", "pw").await.unwrap();
        let claims: TokenClaims = token::decode(&registered).unwrap();
        assert_eq!(claims.roles, vec![Role::from(ROLE_USER)]);
        assert_eq!(claims.exp, 1600);

        let logged_in = accounts.login("alice", "pw").await.unwrap();
        let claims: TokenClaims = token::decode(&logged_in).unwrap();
        assert_eq!(claims.user_id, 1);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let accounts = signed_service();
        accounts.register("alice", "pw").await.unwrap();

        assert!(matches!(
            accounts.login("alice", "nope").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.login("mallory", "pw").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.register("alice", "pw2").await,
            Err(AccountError::LoginTaken)
        ));
        assert!(matches!(
            accounts.login(" ", "pw").await,
            Err(AccountError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn opaque_mode_stores_session() {
        let sessions = Arc::new(MemorySessionRepo::new());
        let accounts = AccountService::new(
            Arc::new(MemoryUserRepo::new()),
            CredentialIssuer::Opaque {
                sessions: sessions.clone(),
                ttl_seconds: 60,
                clock: Arc::new(FixedClock(500)),
            },
        );

        let handle = accounts.register("bob", "pw").await.unwrap();
        assert!(Uuid::parse_str(&handle).is_ok());

        let record = sessions.find(&handle).await.unwrap().unwrap();
        assert_eq!(record.login, "bob");
        assert_eq!((record.issued_at, record.expire_at), (500, 560));
    }

    #[tokio::test]
    async fn opaque_lifetime_overflow_is_an_error() {
        let accounts = AccountService::new(
            Arc::new(MemoryUserRepo::new()),
            CredentialIssuer::Opaque {
                sessions: Arc::new(MemorySessionRepo::new()),
                ttl_seconds: i64::MAX,
                clock: Arc::new(FixedClock(500)),
            },
        );

        assert!(matches!(
            accounts.register("bob", "pw").await,
            Err(AccountError::Token(TokenError::ExpiryOverflow))
        ));
    }
}
