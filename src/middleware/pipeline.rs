//! Per-route interceptor chain.
//!
//! Request-time order: Identification → Authentication → Authorization → handler.
//! The HTTP trace layer (`middleware::http`) wraps the whole router, outside of all three.
//!
//! `ServiceBuilder` puts the first layer outermost, so the stages are listed in
//! execution order. Authorization therefore runs after Authentication has
//! populated the context. Any stage may answer early; nothing inside it runs then.

use std::{sync::Arc, time::Duration};

use axum::{middleware, routing::MethodRouter};
use tower::ServiceBuilder;

use crate::middleware::auth::{
    Authenticator, Authorizer, IdentifyBy, RoleCheck, authenticate::authenticate,
    authorize::authorize, identify::identify,
};
use crate::services::auth::principal::Role;
use crate::services::auth::resolver::PrincipalResolver;

#[derive(Clone)]
pub struct Pipeline {
    identify_by: IdentifyBy,
    authenticator: Authenticator,
    role_check: Arc<dyn RoleCheck>,
}

impl Pipeline {
    pub fn new(
        identify_by: IdentifyBy,
        resolver: Arc<dyn PrincipalResolver>,
        role_check: Arc<dyn RoleCheck>,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            identify_by,
            authenticator: Authenticator::new(resolver, resolve_timeout),
            role_check,
        }
    }

    /// Identification + Authentication.
    pub fn authenticated<S>(&self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    self.identify_by.clone(),
                    identify,
                ))
                .layer(middleware::from_fn_with_state(
                    self.authenticator.clone(),
                    authenticate,
                )),
        )
    }

    /// Identification + Authentication + Authorization (any of `roles`).
    pub fn require_any_role<S, R>(
        &self,
        route: MethodRouter<S>,
        roles: impl IntoIterator<Item = R>,
    ) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        R: Into<Role>,
    {
        let authorizer = Authorizer::new(self.role_check.clone(), roles);

        route.route_layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    self.identify_by.clone(),
                    identify,
                ))
                .layer(middleware::from_fn_with_state(
                    self.authenticator.clone(),
                    authenticate,
                ))
                .layer(middleware::from_fn_with_state(authorizer, authorize)),
        )
    }
}
