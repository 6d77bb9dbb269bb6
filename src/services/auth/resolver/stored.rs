use std::sync::Arc;

use async_trait::async_trait;

use super::{PrincipalResolver, ResolveError};
use crate::context::RequestContext;
use crate::repos::session_repo::SessionRepo;
use crate::services::auth::clock::Clock;
use crate::services::auth::principal::Principal;
use crate::services::auth::token;

/// Opaque bearer handles looked up in a session store.
///
/// Store errors propagate as `Backend`; no retry here.
#[derive(Clone)]
pub struct StoredSessionResolver {
    sessions: Arc<dyn SessionRepo>,
    clock: Arc<dyn Clock>,
}

impl StoredSessionResolver {
    pub fn new(sessions: Arc<dyn SessionRepo>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }
}

#[async_trait]
impl PrincipalResolver for StoredSessionResolver {
    async fn resolve_principal(
        &self,
        _ctx: &RequestContext,
        identifier: &str,
    ) -> Result<Principal, ResolveError> {
        let record = self
            .sessions
            .find(identifier)
            .await?
            .ok_or(ResolveError::UserNotFound)?;

        if !token::is_not_expired(record.expire_at, self.clock.now()) {
            return Err(ResolveError::ExpiredToken);
        }

        Ok(record.into())
    }
}
