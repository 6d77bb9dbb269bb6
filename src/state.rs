/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - accounts: register / login
 *   - pipeline: route ごとの identify → authenticate → authorize
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::middleware::Pipeline;
use crate::services::auth::AccountService;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(accounts: Arc<AccountService>, pipeline: Pipeline) -> Self {
        Self { accounts, pipeline }
    }
}
