//! Peer-service authentication: service token verification + audience check.
//!
//! The token is read from `x-service-token`, or from `authorization` when that
//! key is absent.
//!
//! Methods on `GateConfig::service_auth_exempt_methods` skip this stage. The
//! allowlist is configured explicitly; nothing is exempt by default.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::config::GateConfig;
use crate::context::ServiceClaims;
use crate::error::ErrorEnvelope;
use crate::middleware::auth::{AuthnError, SERVICE_TOKEN_HEADER, bearer_value, request_state};
use crate::services::auth::ClaimVerifier;
use crate::state::AppState;

/// Verify the service token and require this service in its audience.
pub fn verify_service_token(
    verifier: &dyn ClaimVerifier,
    gate: &GateConfig,
    headers: &HeaderMap,
) -> Result<ServiceClaims, AuthnError> {
    let token = bearer_value(headers, SERVICE_TOKEN_HEADER)
        .or_else(|| bearer_value(headers, header::AUTHORIZATION.as_str()))
        .ok_or(AuthnError::MissingServiceToken)?;

    let claims = verifier.verify_service_token(token).map_err(|err| {
        tracing::warn!(error = ?err, "service token verification failed");
        AuthnError::ServiceTokenRejected(err)
    })?;

    if !claims.audience.iter().any(|aud| aud == &gate.service_name) {
        tracing::warn!(
            issuer = %claims.issuer,
            audience = ?claims.audience,
            expected = %gate.service_name,
            "service token audience mismatch"
        );
        return Err(AuthnError::AudienceMismatch);
    }

    Ok(claims)
}

pub async fn authenticate_service(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request,
    next: Next,
) -> Result<Response, ErrorEnvelope> {
    let method = original_uri.path();
    if state.gate.is_exempt(method) {
        tracing::debug!(method, "service authentication skipped for exempt method");
        return Ok(next.run(req).await);
    }

    let current = request_state(&req, &state)?;

    let claims = verify_service_token(state.verifier.as_ref(), &state.gate, req.headers())
        .map_err(|err| state.errors.from_condition(&err, Some(current.request_id())))?;

    tracing::debug!(issuer = %claims.issuer, method, "service authenticated");

    // middleware → handler hand-off
    req.extensions_mut().insert(current.with_service(claims));

    Ok(next.run(req).await)
}
