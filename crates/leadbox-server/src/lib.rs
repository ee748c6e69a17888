//! Leadbox HTTP server.
//!
//! Wires together the core library, storage backend, and HTTP routes into a
//! running Axum server: the public contact intake at `/api/contact` and the
//! admin API at `/api/admin/*`.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
