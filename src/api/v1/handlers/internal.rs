/*
 * Responsibility
 * - internal.v1.InternalService の RPC (ピアサービス専用, service chain の後ろ)
 */
use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::users::{PingResponse, UserResponse, UserTargetRequest},
        extractors::{RequestCtx, RpcJson},
    },
    error::{ErrorEnvelope, FieldViolation},
    state::AppState,
};

use super::lookup_failure;

pub async fn resolve_user(
    State(state): State<AppState>,
    RequestCtx(request): RequestCtx,
    RpcJson(req): RpcJson<UserTargetRequest>,
) -> Result<Json<UserResponse>, ErrorEnvelope> {
    let request_id = request.request_id();

    if let Some(service) = request.service() {
        tracing::debug!(issuer = %service.issuer, "resolve user for peer service");
    }

    let user_id = Uuid::parse_str(&req.user_id).map_err(|_| {
        state.errors.invalid_argument(
            Some(request_id),
            "invalid user_id",
            vec![FieldViolation::new("user_id", "must be a valid UUID")],
        )
    })?;

    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(|err| lookup_failure(&state, request_id, err))?;

    Ok(Json(user.into()))
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}
