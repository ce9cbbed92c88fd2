/*
 * Responsibility
 * - RPC リクエストボディ (JSON) の extractor
 * - axum の JsonRejection を ErrorEnvelope (InvalidArgument) に変換
 * - request id は chain が置いた RequestState から引き継ぐ
 */
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::context::{RequestId, RequestState};
use crate::error::{ErrorEnvelope, ErrorTaxonomy, FieldViolation};
use crate::state::AppState;

/// `Json<T>` whose rejections are error envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcJson<T>(pub T);

impl<T> FromRequest<AppState> for RpcJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ErrorEnvelope;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestState>()
            .map(|s| *s.request_id());

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(RpcJson(value)),
            Err(rejection) => Err(body_rejection(
                &state.errors,
                request_id.as_ref(),
                rejection,
            )),
        }
    }
}

fn body_rejection(
    errors: &ErrorTaxonomy,
    request_id: Option<&RequestId>,
    rejection: JsonRejection,
) -> ErrorEnvelope {
    tracing::debug!(error = %rejection, "request body rejected");

    match rejection {
        JsonRejection::JsonDataError(err) => errors.invalid_argument(
            request_id,
            "invalid request body",
            vec![FieldViolation::new("body", err.body_text())],
        ),
        JsonRejection::JsonSyntaxError(_) => errors.invalid_argument(
            request_id,
            "malformed request body",
            vec![FieldViolation::new("body", "must be valid JSON")],
        ),
        JsonRejection::MissingJsonContentType(_) => errors.invalid_argument(
            request_id,
            "unsupported content type",
            vec![FieldViolation::new(
                "content-type",
                "must be application/json",
            )],
        ),
        other => {
            let message = if other.status() == StatusCode::PAYLOAD_TOO_LARGE {
                "request body too large"
            } else {
                "failed to read request body"
            };
            errors.invalid_argument(request_id, message, Vec::new())
        }
    }
}
