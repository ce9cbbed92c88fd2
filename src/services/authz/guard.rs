//! Role-based authorization for RPC handlers.
//!
//! Handlers call these after the chain has injected `UserClaims`:
//! - `allowed_roles` gates an action on the caller's role.
//! - `comparison_rights_for_admins` additionally resolves initiator and target
//!   and requires the initiator to outrank the target.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::context::UserClaims;
use crate::error::{ErrorCondition, FieldViolation, StatusKind};
use crate::services::auth::Role;
use crate::services::users::{LookupError, User, UserDirectory};

/// An action label plus the roles allowed to perform it.
///
/// The label only shows up in logs.
#[derive(Debug, Clone, Copy)]
pub struct AllowedActionSpec<'a> {
    pub action: &'a str,
    pub roles: &'a [Role],
}

impl<'a> AllowedActionSpec<'a> {
    pub const fn new(action: &'a str, roles: &'a [Role]) -> Self {
        Self { action, roles }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("invalid initiator id")]
    MalformedInitiator,
    #[error("invalid {field}")]
    MalformedTarget { field: &'static str },
    #[error("initiator not found")]
    InitiatorNotFound,
    #[error("user not found")]
    TargetNotFound,
    #[error("initiator is suspended")]
    InitiatorSuspended,
    #[error("role cannot perform this action")]
    RoleNotAllowed { action: String, role: Role },
    #[error("initiator role too low for target")]
    RankTooLow,
    #[error("internal error")]
    Lookup(#[source] LookupError),
}

impl ErrorCondition for GuardError {
    fn kind(&self) -> StatusKind {
        match self {
            GuardError::MalformedInitiator | GuardError::InitiatorNotFound => {
                StatusKind::Unauthenticated
            }
            GuardError::MalformedTarget { .. } => StatusKind::InvalidArgument,
            GuardError::TargetNotFound => StatusKind::NotFound,
            GuardError::InitiatorSuspended
            | GuardError::RoleNotAllowed { .. }
            | GuardError::RankTooLow => StatusKind::PermissionDenied,
            GuardError::Lookup(_) => StatusKind::Internal,
        }
    }

    fn field_violations(&self) -> Vec<FieldViolation> {
        match self {
            GuardError::MalformedTarget { field } => {
                vec![FieldViolation::new(*field, "must be a valid UUID")]
            }
            _ => Vec::new(),
        }
    }
}

/// Admit the initiator when their role is in `spec.roles`.
///
/// Returns the initiator's id so handlers can pass it on.
pub fn allowed_roles(claims: &UserClaims, spec: &AllowedActionSpec<'_>) -> Result<Uuid, GuardError> {
    if !spec.permits(claims.role) {
        warn!(
            action = spec.action,
            role = %claims.role,
            user_id = %claims.id,
            "role not allowed to perform action"
        );
        return Err(GuardError::RoleNotAllowed {
            action: spec.action.to_string(),
            role: claims.role,
        });
    }

    Ok(claims.id)
}

/// Targets holding this role are not ranked against the initiator.
///
/// Nothing outranks a SuperUser, yet the comparison is skipped (the call is
/// admitted) rather than denied. Kept as-is pending a product decision.
pub fn skips_hierarchy_check(target: Role) -> bool {
    target == Role::SuperUser
}

/// Resolve initiator and target and require the initiator to outrank the target.
///
/// `target_field` names the request field the target id came from; it is
/// reported back in the field violation when the id is malformed.
pub async fn comparison_rights_for_admins(
    users: &dyn UserDirectory,
    initiator_id: &str,
    target_id: &str,
    target_field: &'static str,
) -> Result<(User, User), GuardError> {
    // The initiator id comes from a verified token; a bad one is an auth anomaly.
    let initiator_id = Uuid::parse_str(initiator_id).map_err(|_| {
        warn!(initiator_id, "malformed initiator id in verified claims");
        GuardError::MalformedInitiator
    })?;
    let target_id = Uuid::parse_str(target_id)
        .map_err(|_| GuardError::MalformedTarget { field: target_field })?;

    let initiator = match users.find_by_id(initiator_id).await {
        Ok(user) => user,
        Err(LookupError::NotFound) => {
            warn!(%initiator_id, "initiator not found in directory");
            return Err(GuardError::InitiatorNotFound);
        }
        Err(err) => {
            warn!(error = %err, backend = users.backend_name(), "initiator lookup failed");
            return Err(GuardError::Lookup(err));
        }
    };

    if initiator.suspended {
        warn!(%initiator_id, "suspended initiator attempted admin action");
        return Err(GuardError::InitiatorSuspended);
    }

    let target = match users.find_by_id(target_id).await {
        Ok(user) => user,
        Err(LookupError::NotFound) => return Err(GuardError::TargetNotFound),
        Err(err) => {
            warn!(error = %err, backend = users.backend_name(), "target lookup failed");
            return Err(GuardError::Lookup(err));
        }
    };

    if skips_hierarchy_check(target.role) {
        return Ok((initiator, target));
    }

    if !initiator.role.outranks(&target.role) {
        warn!(
            %initiator_id,
            initiator_role = %initiator.role,
            %target_id,
            target_role = %target.role,
            "initiator role too low for target"
        );
        return Err(GuardError::RankTooLow);
    }

    Ok((initiator, target))
}
