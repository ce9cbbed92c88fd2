use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::{error::RepoError, user_repo};
use crate::services::auth::role::UnknownRole;
use crate::services::users::directory::{LookupError, LookupResult, User, UserDirectory};

/// Postgres-backed directory over the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl From<RepoError> for LookupError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Db(err) => LookupError::Backend(err.to_string()),
        }
    }
}

fn row_to_user(row: user_repo::UserRow) -> LookupResult<User> {
    let role = row
        .role
        .parse()
        .map_err(|e: UnknownRole| {
            LookupError::InvalidRecord(format!("user {}: {}", row.id, e))
        })?;

    Ok(User {
        id: row.id,
        name: row.user_name,
        role,
        suspended: row.suspended,
    })
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_id(&self, id: Uuid) -> LookupResult<User> {
        let row = user_repo::get(&self.db, id)
            .await?
            .ok_or(LookupError::NotFound)?;

        row_to_user(row)
    }

    async fn list(&self, limit: i64, offset: i64) -> LookupResult<(Vec<User>, i64)> {
        let rows = user_repo::list(&self.db, limit, offset).await?;
        let total = user_repo::count(&self.db).await?;

        let users = rows
            .into_iter()
            .map(row_to_user)
            .collect::<LookupResult<Vec<_>>>()?;

        Ok((users, total))
    }
}
