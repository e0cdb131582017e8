//! Middleware for observability.
//!
//! Authentication lives in [`crate::auth::middleware`]; this module carries
//! request logging and the [`Rejection`] tag error responses attach for it.

pub mod logging;

pub use logging::{request_logging, LookupTarget, Rejection};
