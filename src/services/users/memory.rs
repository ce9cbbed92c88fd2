use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::services::users::directory::{LookupError, LookupResult, User, UserDirectory};

/// Fixed set of users held in memory.
///
/// Used when no database is configured (development) and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: BTreeMap<Uuid, User>,
}

impl InMemoryUserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_id(&self, id: Uuid) -> LookupResult<User> {
        self.users.get(&id).cloned().ok_or(LookupError::NotFound)
    }

    async fn list(&self, limit: i64, offset: i64) -> LookupResult<(Vec<User>, i64)> {
        let limit = usize::try_from(limit).map_err(|_| LookupError::Backend("negative limit".into()))?;
        let offset =
            usize::try_from(offset).map_err(|_| LookupError::Backend("negative offset".into()))?;

        let page = self.users.values().skip(offset).take(limit).cloned().collect();
        Ok((page, self.users.len() as i64))
    }
}
