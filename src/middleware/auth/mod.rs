/*
 * Responsibility
 * - identification / authentication / authorization の 3 stage
 * - 各 stage は自分専用の context key を持つ (他 stage からは読み取りのみ)
 */
pub mod authenticate;
pub mod authorize;
pub mod identify;

pub use authenticate::{AuthError, Authenticator, authentication};
pub use authorize::{Authorizer, PrincipalRoles, RoleCheck};
pub use identify::{IdentifyBy, identifier};
