//! HTTP API - single-job generation and full lookbook runs

pub mod handlers;
pub mod routes;
