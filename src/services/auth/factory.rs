//! Builds the resolver and credential issuer selected by `Config`.
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::{Config, SessionBackend, TokenScheme};
use crate::repos::session_repo::{MemorySessionRepo, PgSessionRepo, SessionRepo};
use crate::repos::valkey_session_repo::ValkeySessionRepo;
use crate::services::auth::account::CredentialIssuer;
use crate::services::auth::clock::Clock;
use crate::services::auth::issuer::TokenIssuer;
use crate::services::auth::resolver::{
    LocalTokenResolver, PrincipalResolver, StoredSessionResolver,
};
use crate::services::auth::token::{TokenSigner, TokenVerifier};

pub struct AuthComponents {
    pub resolver: Arc<dyn PrincipalResolver>,
    pub credentials: CredentialIssuer,
}

pub async fn build_auth(
    config: &Config,
    db: Option<&PgPool>,
    clock: Arc<dyn Clock>,
) -> Result<AuthComponents> {
    let ttl = config.access_token_ttl_seconds;

    let components = match &config.token_scheme {
        TokenScheme::Hs256 { secret } => signed(
            TokenSigner::hs256(secret.as_bytes()),
            TokenVerifier::hs256(secret.as_bytes()),
            ttl,
            clock,
        ),
        TokenScheme::Rs256 {
            private_key_pem,
            public_key_pem,
        } => {
            let signer = TokenSigner::rs256_pem(private_key_pem.as_bytes())
                .context("AUTH_RSA_PRIVATE_KEY_PEM is not an RSA private key")?;
            let verifier = TokenVerifier::rs256_pem(public_key_pem.as_bytes())
                .context("AUTH_RSA_PUBLIC_KEY_PEM is not an RSA public key")?;

            signed(signer, verifier, ttl, clock)
        }
        TokenScheme::Opaque => {
            let sessions = build_session_repo(config, db).await?;
            tracing::info!(backend = sessions.backend_name(), "opaque session store ready");

            AuthComponents {
                resolver: Arc::new(StoredSessionResolver::new(sessions.clone(), clock.clone())),
                credentials: CredentialIssuer::Opaque {
                    sessions,
                    ttl_seconds: ttl,
                    clock,
                },
            }
        }
    };

    Ok(components)
}

fn signed(
    signer: TokenSigner,
    verifier: TokenVerifier,
    ttl: i64,
    clock: Arc<dyn Clock>,
) -> AuthComponents {
    tracing::info!(scheme = verifier.scheme().name(), ttl, "signed tokens enabled");

    AuthComponents {
        resolver: Arc::new(LocalTokenResolver::new(verifier, clock.clone())),
        credentials: CredentialIssuer::Signed(TokenIssuer::new(signer, ttl, clock)),
    }
}

async fn build_session_repo(config: &Config, db: Option<&PgPool>) -> Result<Arc<dyn SessionRepo>> {
    let repo: Arc<dyn SessionRepo> = match config.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionRepo::new()),
        SessionBackend::Postgres => {
            let db = db.context("postgres session backend requires DATABASE_URL")?;
            Arc::new(PgSessionRepo::new(db.clone()))
        }
        SessionBackend::Valkey => {
            let url = config
                .valkey_url
                .as_deref()
                .context("valkey session backend requires VALKEY_URL")?;
            Arc::new(
                ValkeySessionRepo::connect(url)
                    .await
                    .context("failed to connect to valkey")?,
            )
        }
    };

    Ok(repo)
}
