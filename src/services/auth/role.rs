use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Privilege level carried in user tokens and stored on user records.
///
/// Variant order is the privilege order: `User < Moderator < Admin < SuperUser`.
/// Serialized lowercase; parsed case-insensitively from tokens and records alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    User,
    Moderator,
    Admin,
    SuperUser,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Moderator, Role::Admin, Role::SuperUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperUser => "superuser",
        }
    }

    /// `1` when `self` ranks above `other`, `0` for peers, `-1` below.
    pub fn compare(&self, other: &Role) -> i8 {
        match self.cmp(other) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => -1,
        }
    }

    /// Strict dominance; peers never outrank each other.
    pub fn outranks(&self, other: &Role) -> bool {
        self.compare(other) >= 1
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            "superuser" => Ok(Role::SuperUser),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
