/*
 * Responsibility
 * - 認証済み主体 (Principal) と Role の型
 * - token payload (claims) の型と Principal への変換
 *
 * Notes
 * - Principal は request ごとに作り直す。永続化しない。
 * - Role は階層なし・大小文字区別ありの opaque tag。比較は一致のみ。
 */
use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token payload.
///
/// `{"userId":1,"login":"alice","roles":["ADMIN"],"iat":1000,"exp":1600}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub login: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub iat: i64,
    pub exp: i64,
}

/// Resolved identity for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: i64,
    pub login: String,
    pub roles: Vec<Role>,
    pub issued_at: i64,
    pub expire_at: i64,
}

impl Principal {
    /// OR semantics: true if any required role is held. An empty `required` never matches.
    pub fn has_any_role(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.roles.contains(role))
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            login: claims.login,
            roles: claims.roles,
            issued_at: claims.iat,
            expire_at: claims.exp,
        }
    }
}
