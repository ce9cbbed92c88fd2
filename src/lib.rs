//! Request-gating layer for an RPC service.
//!
//! Every inbound call passes an ordered chain: correlation id, then service
//! or user authentication, then role checks in the handler. Rejections leave
//! as an `ErrorEnvelope` carrying reason, domain, timestamp and request id.

pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
