/**
 * Responsibility
 *  - chain が置いた RequestState を handler に渡す
 *  - axum 依存は core に閉じ込める (状態の型は crate::context)
 */

mod core;

pub use self::core::{RequestCtx, UserCtx};
