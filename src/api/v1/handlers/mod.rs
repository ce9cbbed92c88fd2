/*
 * Responsibility
 * - RPC handler 群。各 handler はルートグループの chain の後ろで動く
 *   - users: エンドユーザー向け RPC
 *   - admin: 管理者が他ユーザーに作用する RPC (role + 階層チェック)
 *   - internal: サービス間 RPC
 */
pub mod admin;
pub mod health;
pub mod internal;
pub mod users;

use crate::context::RequestId;
use crate::error::ErrorEnvelope;
use crate::services::users::LookupError;
use crate::state::AppState;

/// Directory failure → envelope. Backend detail is logged, never returned.
fn lookup_failure(state: &AppState, request_id: &RequestId, err: LookupError) -> ErrorEnvelope {
    match err {
        LookupError::NotFound => state.errors.not_found(Some(request_id), "user not found"),
        err => {
            tracing::error!(error = %err, backend = state.users.backend_name(), "user lookup failed");
            state.errors.internal(Some(request_id), "internal error")
        }
    }
}
