//! User lookup interface used by the authorization guard and handlers.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::services::auth::Role;

/// Stored user record as seen by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub suspended: bool,
}

/// Directory-layer errors.
///
/// Not:
/// - `NotFound` is a normal answer; callers decide what it means
///   (an unknown initiator is an authentication problem, an unknown target is not).
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("user not found")]
    NotFound,
    #[error("directory backend error: {0}")]
    Backend(String),
    #[error("invalid user record: {0}")]
    InvalidRecord(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Read-only view over user records.
///
/// Implementations must be shareable across concurrent calls and must not retry internally.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn find_by_id(&self, id: Uuid) -> LookupResult<User>;

    // Returns one page of users ordered by id plus the total count.
    async fn list(&self, limit: i64, offset: i64) -> LookupResult<(Vec<User>, i64)>;
}
