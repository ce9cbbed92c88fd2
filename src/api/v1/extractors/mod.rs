pub mod request_ctx;
pub mod rpc_json;

pub use request_ctx::{RequestCtx, UserCtx};
pub use rpc_json::RpcJson;
