//! Library half of the `crm-server` binary, so the router can be driven
//! in-process by tests.

pub mod config;
pub mod http;
