//! HTTP API: configuration, request guarding, routing and response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
