//! HTTP-level middleware (cross-cutting concerns).
//!
//! This module is for transport/infrastructure concerns that should apply to
//! all routes, in front of the authentication chain.
//!
//! Responsibility:
//! - Echo the caller's X-Request-Id back on the response
//! - Access logging / request tracing (TraceLayer), with the request id on the span
//! - Body size limits (enforced by the body extractor, so oversize is an error envelope)
//!
//! Notes:
//! - No request id is generated here. A call without one is rejected by the
//!   correlator, so it must reach the chain as the caller sent it.
//! - No timeout layer: deadlines belong to the caller.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, header::HeaderName};
use tower::ServiceBuilder;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

use crate::error::UNKNOWN_REQUEST_ID;
use crate::middleware::auth::REQUEST_ID_HEADER;

/// Span per call carrying method path and the caller's request id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcSpan;

impl<B> MakeSpan<B> for RpcSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN_REQUEST_ID);

        tracing::info_span!(
            "rpc",
            method = %request.uri().path(),
            request_id = %request_id,
        )
    }
}

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Request-Id header: `x-request-id` (propagated, never generated)
/// - Body limit: `max_body_bytes`
pub fn apply(router: Router, max_body_bytes: usize) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http().make_span_with(RpcSpan))
        // Copy the caller's request id onto the response.
        .layer(PropagateRequestIdLayer::new(request_id_header))
        // Read limit for RpcJson; overflow surfaces as InvalidArgument.
        .layer(DefaultBodyLimit::max(max_body_bytes));

    router.layer(layers)
}
