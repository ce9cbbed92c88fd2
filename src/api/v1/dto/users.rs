/*
 * Responsibility
 * - user / admin RPC のリクエスト・レスポンス DTO
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::UserClaims;
use crate::services::{auth::Role, users::User};

/// Target of an admin-on-user action. `user_id` is caller input and parsed by the guard.
#[derive(Debug, Deserialize)]
pub struct UserTargetRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub suspended: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            role: u.role,
            suspended: u.suspended,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub session_id: String,
    pub verified: bool,
    pub role: Role,
    pub user: Option<UserResponse>,
}

impl ProfileResponse {
    pub fn new(claims: UserClaims, user: Option<User>) -> Self {
        Self {
            id: claims.id,
            session_id: claims.session_id,
            verified: claims.verified,
            role: claims.role,
            user: user.map(UserResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}
