use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::{RequestState, UserClaims};
use crate::error::ErrorEnvelope;
use crate::state::AppState;

/// Extractor for the `RequestState` left by the chain.
///
/// Assumes the correlator ran for this route. Missing state means the route
/// was mounted outside the chain, which is a server bug (Internal).
#[derive(Debug, Clone)]
pub struct RequestCtx(pub RequestState);

impl FromRequestParts<AppState> for RequestCtx
where
    AppState: Send + Sync,
{
    type Rejection = ErrorEnvelope;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestState>()
            .cloned()
            .map(RequestCtx)
            .ok_or_else(|| {
                tracing::error!("handler reached without request state");
                state.errors.internal(None, "internal error")
            })
    }
}

/// Extractor for calls that passed user authentication.
#[derive(Debug, Clone)]
pub struct UserCtx {
    pub request: RequestState,
    pub claims: UserClaims,
}

impl FromRequestParts<AppState> for UserCtx
where
    AppState: Send + Sync,
{
    type Rejection = ErrorEnvelope;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequestCtx(request) = RequestCtx::from_request_parts(parts, state).await?;

        let claims = request.user().cloned().ok_or_else(|| {
            tracing::error!(request_id = %request.request_id(), "handler reached without user claims");
            state
                .errors
                .unauthenticated(Some(request.request_id()), "missing user token")
        })?;

        Ok(UserCtx { request, claims })
    }
}
