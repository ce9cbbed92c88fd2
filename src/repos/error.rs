/*
 * Responsibility
 * - repo 層が上に返すエラーの種類
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}
