/*
 * Responsibility
 * - register / login の request/response DTO
 */
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for CredentialsRequest {
    // Never print the password
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
