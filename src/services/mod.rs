/*
 * Responsibility
 * - chain と handler が使う協調オブジェクトとポリシー
 *   - auth: role + token 検証
 *   - authz: role / 階層チェック
 *   - users: user directory (Postgres / in-memory)
 */
pub mod auth;
pub mod authz;
pub mod users;
