//! HTTP surface: cache administration and document analysis.

pub mod config;
pub mod routes;
pub mod server;
