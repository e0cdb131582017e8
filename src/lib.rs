//! J1939 API Library
//!
//! Token-gated lookup service over the SAE J1939 PGN/SPN reference dataset.
//! Exposes the modules used by the server binary and the integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod reference;
