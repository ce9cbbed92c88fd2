/*
 * Responsibility
 * - RPC メソッドパス (/package.Service/Method) → handler
 * - どのグループにどの chain をかけるかをここで決める
 *   - user + admin RPC: correlator → user 認証
 *   - internal RPC:     correlator → service 認証
 */
use axum::{Router, routing::post};

use crate::middleware::auth::{apply_service_chain, apply_user_chain};
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::{get_user, list_users},
    internal::{ping, resolve_user},
    users::get_profile,
};

pub const GET_PROFILE: &str = "/users.v1.UserService/GetProfile";
pub const ADMIN_GET_USER: &str = "/admin.v1.AdminService/GetUser";
pub const ADMIN_LIST_USERS: &str = "/admin.v1.AdminService/ListUsers";
pub const INTERNAL_RESOLVE_USER: &str = "/internal.v1.InternalService/ResolveUser";
pub const INTERNAL_PING: &str = "/internal.v1.InternalService/Ping";

pub fn routes(state: AppState) -> Router<AppState> {
    let user_rpcs = Router::new()
        .route(GET_PROFILE, post(get_profile))
        .route(ADMIN_GET_USER, post(get_user))
        .route(ADMIN_LIST_USERS, post(list_users));

    let service_rpcs = Router::new()
        .route(INTERNAL_RESOLVE_USER, post(resolve_user))
        .route(INTERNAL_PING, post(ping));

    Router::new()
        .merge(apply_user_chain(user_rpcs, state.clone()))
        .merge(apply_service_chain(service_rpcs, state))
}
