pub mod error;
pub mod session_repo;
pub mod user_repo;
pub mod valkey_session_repo;
