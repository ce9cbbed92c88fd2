//! Authentication stages of the interceptor chain.
//!
//! Order per call:
//! 1. `request_id::correlate` reads `x-request-id` and seeds `RequestState`.
//! 2. `service::authenticate_service` (peer-service routes) verifies the service token.
//! 3. `user::authenticate_user` (end-user routes) verifies `x-user-token`.
//!
//! Each stage either forwards an augmented `RequestState` in the request
//! extensions or ends the call with an `ErrorEnvelope`.

use axum::{Router, extract::Request, http::HeaderMap, middleware};
use thiserror::Error;

use crate::context::RequestState;
use crate::error::{ErrorCondition, ErrorEnvelope, StatusKind};
use crate::services::auth::VerifyError;
use crate::state::AppState;

pub mod request_id;
pub mod service;
pub mod user;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const SERVICE_TOKEN_HEADER: &str = "x-service-token";
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Why a stage refused the call.
///
/// The messages are what the client sees; verifier detail stays in `source()`.
#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("missing request id")]
    MissingRequestId,
    #[error("invalid request id")]
    InvalidRequestId,
    #[error("missing service token")]
    MissingServiceToken,
    #[error("failed to verify service token")]
    ServiceTokenRejected(#[source] VerifyError),
    #[error("service token is not valid for this service")]
    AudienceMismatch,
    #[error("missing user token")]
    MissingUserToken,
    #[error("failed to verify user token")]
    UserTokenRejected(#[source] VerifyError),
    #[error("invalid user identity")]
    MalformedSubject,
    #[error("internal error")]
    StateMissing,
}

impl ErrorCondition for AuthnError {
    fn kind(&self) -> StatusKind {
        match self {
            // Chain wired without the correlator
            AuthnError::StateMissing => StatusKind::Internal,
            _ => StatusKind::Unauthenticated,
        }
    }
}

/// Token from a metadata key; a `Bearer ` prefix is tolerated.
fn bearer_value<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    let raw = headers.get(key)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

/// `RequestState` published by the previous stage.
fn request_state(req: &Request, state: &AppState) -> Result<RequestState, ErrorEnvelope> {
    req.extensions().get::<RequestState>().cloned().ok_or_else(|| {
        tracing::error!("request state missing; correlator not applied to this route");
        state.errors.from_condition(&AuthnError::StateMissing, None)
    })
}

/// Gate end-user routes: correlator, then user authentication.
///
/// `route_layer` keeps unmatched paths (404) out of the chain.
pub fn apply_user_chain(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // Last layer added runs first
    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user::authenticate_user,
        ))
        .route_layer(middleware::from_fn_with_state(state, request_id::correlate))
}

/// Gate peer-service routes: correlator, then service authentication.
pub fn apply_service_chain(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            service::authenticate_service,
        ))
        .route_layer(middleware::from_fn_with_state(state, request_id::correlate))
}
