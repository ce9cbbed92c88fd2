//! Per-call state threaded through the interceptor chain.
//!
//! Each stage reads the `RequestState` left in the request extensions by the
//! previous stage and publishes a new one. Nothing here outlives the call.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::services::auth::Role;

/// Caller-supplied correlation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Verified identity of a peer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceClaims {
    pub issuer: String,
    pub audience: Vec<String>,
}

/// Verified identity of an end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub id: Uuid,
    pub session_id: String,
    pub verified: bool,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState {
    request_id: RequestId,
    service: Option<ServiceClaims>,
    user: Option<UserClaims>,
}

impl RequestState {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            service: None,
            user: None,
        }
    }

    pub fn with_service(self, claims: ServiceClaims) -> Self {
        Self {
            service: Some(claims),
            ..self
        }
    }

    pub fn with_user(self, claims: UserClaims) -> Self {
        Self {
            user: Some(claims),
            ..self
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn service(&self) -> Option<&ServiceClaims> {
        self.service.as_ref()
    }

    pub fn user(&self) -> Option<&UserClaims> {
        self.user.as_ref()
    }
}
