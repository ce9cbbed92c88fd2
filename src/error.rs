/*
 * Responsibility
 * - 拒否された呼び出しが取りうる status kind の定義
 * - ErrorTaxonomy: 失敗条件 + request id → ErrorEnvelope
 * - ErrorEnvelope の IntoResponse (HTTP status + 構造化 details 付き JSON)
 */
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::context::RequestId;

/// Stamped on envelopes when the call never got a usable request id.
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

const ERROR_INFO_TYPE: &str = "type.googleapis.com/google.rpc.ErrorInfo";
const BAD_REQUEST_TYPE: &str = "type.googleapis.com/google.rpc.BadRequest";

/// Canonical status kinds surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Internal,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
}

impl StatusKind {
    pub const ALL: [StatusKind; 7] = [
        StatusKind::Internal,
        StatusKind::InvalidArgument,
        StatusKind::Unauthenticated,
        StatusKind::PermissionDenied,
        StatusKind::NotFound,
        StatusKind::AlreadyExists,
        StatusKind::FailedPrecondition,
    ];

    /// Uppercase snake name. Doubles as the envelope's `reason`.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Internal => "INTERNAL",
            StatusKind::InvalidArgument => "INVALID_ARGUMENT",
            StatusKind::Unauthenticated => "UNAUTHENTICATED",
            StatusKind::PermissionDenied => "PERMISSION_DENIED",
            StatusKind::NotFound => "NOT_FOUND",
            StatusKind::AlreadyExists => "ALREADY_EXISTS",
            StatusKind::FailedPrecondition => "FAILED_PRECONDITION",
        }
    }

    /// Numeric RPC status code.
    pub fn rpc_code(&self) -> u16 {
        match self {
            StatusKind::InvalidArgument => 3,
            StatusKind::NotFound => 5,
            StatusKind::AlreadyExists => 6,
            StatusKind::PermissionDenied => 7,
            StatusKind::FailedPrecondition => 9,
            StatusKind::Internal => 13,
            StatusKind::Unauthenticated => 16,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            StatusKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            StatusKind::InvalidArgument | StatusKind::FailedPrecondition => StatusCode::BAD_REQUEST,
            StatusKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            StatusKind::PermissionDenied => StatusCode::FORBIDDEN,
            StatusKind::NotFound => StatusCode::NOT_FOUND,
            StatusKind::AlreadyExists => StatusCode::CONFLICT,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single offending input field on an `InvalidArgument` error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub description: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }
}

/// A failure condition that knows which client-facing kind it maps to.
///
/// `Display` is the client message, so implementations must keep internals
/// (verifier errors, backend messages) out of it and expose them through
/// `source()` for logging instead.
pub trait ErrorCondition: std::error::Error {
    fn kind(&self) -> StatusKind;

    fn field_violations(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}

/// Client-facing error, built once at the point of failure.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    kind: StatusKind,
    domain: String,
    message: String,
    timestamp: DateTime<Utc>,
    request_id: String,
    field_violations: Vec<FieldViolation>,
}

impl ErrorEnvelope {
    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn reason(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// RFC3339, UTC, nanosecond precision.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn field_violations(&self) -> &[FieldViolation] {
        &self.field_violations
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ErrorEnvelope {}

/// Builds envelopes stamped with this service's domain.
///
/// Cheap to clone; one instance lives in `AppState`.
#[derive(Debug, Clone)]
pub struct ErrorTaxonomy {
    domain: std::sync::Arc<str>,
}

impl ErrorTaxonomy {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn build(
        &self,
        kind: StatusKind,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
        field_violations: Vec<FieldViolation>,
    ) -> ErrorEnvelope {
        ErrorEnvelope {
            kind,
            domain: self.domain.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            request_id: request_id
                .map(ToString::to_string)
                .unwrap_or_else(|| UNKNOWN_REQUEST_ID.to_string()),
            field_violations,
        }
    }

    /// Map a failure condition onto its kind.
    pub fn from_condition<E: ErrorCondition + ?Sized>(
        &self,
        condition: &E,
        request_id: Option<&RequestId>,
    ) -> ErrorEnvelope {
        self.build(
            condition.kind(),
            request_id,
            condition.to_string(),
            condition.field_violations(),
        )
    }

    pub fn internal(&self, request_id: Option<&RequestId>, message: impl Into<String>) -> ErrorEnvelope {
        self.build(StatusKind::Internal, request_id, message, Vec::new())
    }

    pub fn invalid_argument(
        &self,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
        field_violations: Vec<FieldViolation>,
    ) -> ErrorEnvelope {
        self.build(
            StatusKind::InvalidArgument,
            request_id,
            message,
            field_violations,
        )
    }

    pub fn unauthenticated(
        &self,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
    ) -> ErrorEnvelope {
        self.build(StatusKind::Unauthenticated, request_id, message, Vec::new())
    }

    pub fn permission_denied(
        &self,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
    ) -> ErrorEnvelope {
        self.build(StatusKind::PermissionDenied, request_id, message, Vec::new())
    }

    pub fn not_found(&self, request_id: Option<&RequestId>, message: impl Into<String>) -> ErrorEnvelope {
        self.build(StatusKind::NotFound, request_id, message, Vec::new())
    }

    pub fn already_exists(
        &self,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
    ) -> ErrorEnvelope {
        self.build(StatusKind::AlreadyExists, request_id, message, Vec::new())
    }

    pub fn failed_precondition(
        &self,
        request_id: Option<&RequestId>,
        message: impl Into<String>,
    ) -> ErrorEnvelope {
        self.build(
            StatusKind::FailedPrecondition,
            request_id,
            message,
            Vec::new(),
        )
    }
}

#[derive(Serialize)]
struct ErrorInfoDetail<'a> {
    #[serde(rename = "@type")]
    type_url: &'static str,
    reason: &'static str,
    domain: &'a str,
    metadata: ErrorInfoMetadata<'a>,
}

#[derive(Serialize)]
struct ErrorInfoMetadata<'a> {
    timestamp: String,
    request_id: &'a str,
}

#[derive(Serialize)]
struct BadRequestDetail<'a> {
    #[serde(rename = "@type")]
    type_url: &'static str,
    field_violations: &'a [FieldViolation],
}

/// Serialize `details` into the body's `details` array.
///
/// A serialization failure leaves the body without details; status and
/// message are never replaced.
fn attach_details<D: Serialize>(body: &mut Value, details: &D) {
    match serde_json::to_value(details) {
        Ok(value) => body["error"]["details"] = value,
        Err(err) => {
            tracing::error!(error = %err, "failed to attach error details");
        }
    }
}

impl ErrorEnvelope {
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": {
                "code": self.kind.rpc_code(),
                "status": self.kind.as_str(),
                "message": self.message,
            }
        });

        let mut details = vec![serde_json::to_value(ErrorInfoDetail {
            type_url: ERROR_INFO_TYPE,
            reason: self.reason(),
            domain: &self.domain,
            metadata: ErrorInfoMetadata {
                timestamp: self.timestamp_rfc3339(),
                request_id: &self.request_id,
            },
        })];

        if self.kind == StatusKind::InvalidArgument && !self.field_violations.is_empty() {
            details.push(serde_json::to_value(BadRequestDetail {
                type_url: BAD_REQUEST_TYPE,
                field_violations: &self.field_violations,
            }));
        }

        match details.into_iter().collect::<Result<Vec<_>, _>>() {
            Ok(details) => attach_details(&mut body, &details),
            Err(err) => tracing::error!(error = %err, "failed to encode error details"),
        }

        body
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.kind.http_status(), Json(self.to_json())).into_response()
    }
}
