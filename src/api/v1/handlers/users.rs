/*
 * Responsibility
 * - users.v1.UserService の RPC (エンドユーザー向け)
 * - chain から UserCtx を受け取り、認可は guard に任せる
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::users::ProfileResponse, extractors::UserCtx},
    error::ErrorEnvelope,
    services::{
        auth::Role,
        authz::{AllowedActionSpec, allowed_roles},
        users::LookupError,
    },
    state::AppState,
};

use super::lookup_failure;

const GET_PROFILE: AllowedActionSpec<'static> = AllowedActionSpec::new("users.get_profile", &Role::ALL);

pub async fn get_profile(
    State(state): State<AppState>,
    ctx: UserCtx,
) -> Result<Json<ProfileResponse>, ErrorEnvelope> {
    let request_id = ctx.request.request_id();

    let user_id = allowed_roles(&ctx.claims, &GET_PROFILE)
        .map_err(|err| state.errors.from_condition(&err, Some(request_id)))?;

    // A caller may hold a valid token without a directory record yet.
    let user = match state.users.find_by_id(user_id).await {
        Ok(user) => Some(user),
        Err(LookupError::NotFound) => None,
        Err(err) => return Err(lookup_failure(&state, request_id, err)),
    };

    Ok(Json(ProfileResponse::new(ctx.claims.clone(), user)))
}
