//! JSON-RPC over HTTP: envelope types, rate limiting, method dispatch, and
//! the axum gateway that ties them together.

pub mod dispatch;
pub mod gateway;
pub mod jsonrpc;
pub mod rate_limit;
