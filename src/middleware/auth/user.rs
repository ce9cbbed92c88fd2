//! End-user authentication: `x-user-token` verification → `UserClaims` in `RequestState`.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::context::UserClaims;
use crate::error::ErrorEnvelope;
use crate::middleware::auth::{AuthnError, USER_TOKEN_HEADER, bearer_value, request_state};
use crate::services::auth::ClaimVerifier;
use crate::state::AppState;

/// Verify the user token and lift its claims into `UserClaims`.
///
/// Only the subject is transformed (parsed as a UUID); session, verified
/// flag and role are passed through as the verifier returned them.
pub fn verify_user_token(
    verifier: &dyn ClaimVerifier,
    headers: &HeaderMap,
) -> Result<UserClaims, AuthnError> {
    let token = bearer_value(headers, USER_TOKEN_HEADER).ok_or(AuthnError::MissingUserToken)?;

    let claims = verifier.verify_user_token(token).map_err(|err| {
        tracing::warn!(error = ?err, "user token verification failed");
        AuthnError::UserTokenRejected(err)
    })?;

    let id = Uuid::parse_str(&claims.subject).map_err(|_| {
        tracing::warn!(subject = %claims.subject, "user token subject is not a UUID");
        AuthnError::MalformedSubject
    })?;

    Ok(UserClaims {
        id,
        session_id: claims.session_id,
        verified: claims.verified,
        role: claims.role,
    })
}

pub async fn authenticate_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorEnvelope> {
    let current = request_state(&req, &state)?;

    let claims = verify_user_token(state.verifier.as_ref(), req.headers())
        .map_err(|err| state.errors.from_condition(&err, Some(current.request_id())))?;

    req.extensions_mut().insert(current.with_user(claims));

    Ok(next.run(req).await)
}
