use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::context::{RequestId, RequestState};
use crate::error::ErrorEnvelope;
use crate::middleware::auth::{AuthnError, REQUEST_ID_HEADER};
use crate::state::AppState;

/// Read and validate the caller-supplied correlation id.
pub fn read_request_id(headers: &HeaderMap) -> Result<RequestId, AuthnError> {
    let raw = headers
        .get(REQUEST_ID_HEADER)
        .ok_or(AuthnError::MissingRequestId)?
        .to_str()
        .map_err(|_| AuthnError::InvalidRequestId)?;

    raw.parse().map_err(|_| AuthnError::InvalidRequestId)
}

/// First stage: seed `RequestState` with the request id.
pub async fn correlate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorEnvelope> {
    let request_id = read_request_id(req.headers()).map_err(|err| {
        tracing::warn!(error = %err, "rejecting call without a usable request id");
        state.errors.from_condition(&err, None)
    })?;

    req.extensions_mut().insert(RequestState::new(request_id));

    Ok(next.run(req).await)
}
