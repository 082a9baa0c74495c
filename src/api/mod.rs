//! HTTP API and run log streaming.

pub mod logs;
pub mod server;
pub mod types;
