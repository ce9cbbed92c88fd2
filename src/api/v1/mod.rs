/*
 * Responsibility
 * - v1 の公開範囲 (routes() とメソッドパスの re-export)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{
    ADMIN_GET_USER, ADMIN_LIST_USERS, GET_PROFILE, INTERNAL_PING, INTERNAL_RESOLVE_USER, routes,
};
