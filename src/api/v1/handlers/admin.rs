/*
 * Responsibility
 * - admin.v1.AdminService の RPC
 * - まず role で弾き、他ユーザーへの操作は階層比較も通す
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::{
            pagination::{ListResponse, PageMeta, PageRequest, calculate_limit_offset},
            users::{UserResponse, UserTargetRequest},
        },
        extractors::{RpcJson, UserCtx},
    },
    error::ErrorEnvelope,
    services::{
        auth::Role,
        authz::{AllowedActionSpec, allowed_roles, comparison_rights_for_admins},
    },
    state::AppState,
};

use super::lookup_failure;

const GET_USER: AllowedActionSpec<'static> =
    AllowedActionSpec::new("admin.get_user", &[Role::Admin, Role::SuperUser]);

const LIST_USERS: AllowedActionSpec<'static> = AllowedActionSpec::new(
    "admin.list_users",
    &[Role::Moderator, Role::Admin, Role::SuperUser],
);

pub async fn get_user(
    State(state): State<AppState>,
    ctx: UserCtx,
    RpcJson(req): RpcJson<UserTargetRequest>,
) -> Result<Json<UserResponse>, ErrorEnvelope> {
    let request_id = ctx.request.request_id();

    let initiator_id = allowed_roles(&ctx.claims, &GET_USER)
        .map_err(|err| state.errors.from_condition(&err, Some(request_id)))?;

    let (_, target) = comparison_rights_for_admins(
        state.users.as_ref(),
        &initiator_id.to_string(),
        &req.user_id,
        "user_id",
    )
    .await
    .map_err(|err| state.errors.from_condition(&err, Some(request_id)))?;

    Ok(Json(target.into()))
}

pub async fn list_users(
    State(state): State<AppState>,
    ctx: UserCtx,
    RpcJson(req): RpcJson<PageRequest>,
) -> Result<Json<ListResponse<UserResponse>>, ErrorEnvelope> {
    let request_id = ctx.request.request_id();

    allowed_roles(&ctx.claims, &LIST_USERS)
        .map_err(|err| state.errors.from_condition(&err, Some(request_id)))?;

    let violations = req.violations();
    if !violations.is_empty() {
        return Err(state
            .errors
            .invalid_argument(Some(request_id), "invalid page request", violations));
    }

    let (limit, offset) = calculate_limit_offset(&req);
    let (users, total) = state
        .users
        .list(limit, offset)
        .await
        .map_err(|err| lookup_failure(&state, request_id, err))?;

    Ok(Json(ListResponse {
        items: users.into_iter().map(UserResponse::from).collect(),
        pagination: PageMeta::new(&req, total),
    }))
}
