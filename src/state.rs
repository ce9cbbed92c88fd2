/*
 * Responsibility
 * - Router に載せる共有状態 (AppState)
 *   - gate 設定, claim verifier, user directory, error taxonomy
 * - リクエストごとに Clone されるので中身は Arc (安い Clone)
 * - 起動後は読み取り専用。呼び出し単位のデータは置かない
 */
use std::sync::Arc;

use crate::config::GateConfig;
use crate::error::ErrorTaxonomy;
use crate::services::{auth::ClaimVerifier, users::UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<GateConfig>,
    pub verifier: Arc<dyn ClaimVerifier>,
    pub users: Arc<dyn UserDirectory>,
    pub errors: ErrorTaxonomy,
}

impl AppState {
    pub fn new(
        gate: GateConfig,
        verifier: Arc<dyn ClaimVerifier>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        let errors = ErrorTaxonomy::new(&gate.error_domain);
        Self {
            gate: Arc::new(gate),
            verifier,
            users,
            errors,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gate", &self.gate)
            .field("users", &self.users.backend_name())
            .finish()
    }
}
