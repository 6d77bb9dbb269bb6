pub mod account;
pub mod clock;
pub mod factory;
pub mod fingerprint;
pub mod issuer;
pub mod principal;
pub mod resolver;
pub mod token;

pub use account::AccountService;
pub use factory::build_auth;
pub use principal::{Principal, Role};
pub use resolver::PrincipalResolver;
