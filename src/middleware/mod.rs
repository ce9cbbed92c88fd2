/*
 * Responsibility
 * - middleware 層の公開範囲
 *   - auth: 呼び出しごとの interceptor chain (request id → service/user 認証)
 *   - http: 全ルートにかける transport 層の layer
 */
pub mod auth;
pub mod http;
