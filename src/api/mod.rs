pub mod reference_api;
pub mod routes;

pub use routes::{create_router, AppState, HealthResponse, HttpErrorResponse};
