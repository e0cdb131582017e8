//! Reference Lookup Endpoints
//! Mission: Expose PGN/SPN lookups and PGN decoding over HTTP

use crate::middleware::Rejection;
use crate::reference::{
    models::{PgnId, PgnRecord, SpnRecord},
    LookupEngine, LookupError,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct PgnQuery {
    pub pgn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpnQuery {
    pub spn: Option<String>,
}

// Bulk routes serialize from the shared index without copying it

/// GET /api/all - the whole dataset
pub async fn get_all(State(engine): State<LookupEngine>) -> Response {
    Json(engine.dataset()).into_response()
}

/// GET /api/PGNs/all
pub async fn get_all_pgns(State(engine): State<LookupEngine>) -> Response {
    Json(engine.all_pgns()).into_response()
}

/// GET /api/PGNs?pgn= - a one-entry map keyed by the PGN
pub async fn get_pgn(
    State(engine): State<LookupEngine>,
    Query(params): Query<PgnQuery>,
) -> Result<Json<BTreeMap<PgnId, PgnRecord>>, ApiError> {
    let pgn = required(params.pgn, "pgn")?;
    let record = engine.pgn(&pgn)?.clone();
    Ok(Json(BTreeMap::from([(pgn, record)])))
}

/// GET /api/PGNDecoder?pgn= - the PGN's SPN records, in PGN order
pub async fn decode_pgn(
    State(engine): State<LookupEngine>,
    Query(params): Query<PgnQuery>,
) -> Result<Json<Vec<SpnRecord>>, ApiError> {
    let pgn = required(params.pgn, "pgn")?;
    let spns = engine.decode(&pgn)?.into_iter().cloned().collect();
    Ok(Json(spns))
}

/// GET /api/SPNs/all
pub async fn get_all_spns(State(engine): State<LookupEngine>) -> Response {
    Json(engine.all_spns()).into_response()
}

/// GET /api/SPNs?spn= - single-element list, matching the bulk query shape
pub async fn get_spn(
    State(engine): State<LookupEngine>,
    Query(params): Query<SpnQuery>,
) -> Result<Json<Vec<SpnRecord>>, ApiError> {
    let spn = required(params.spn, "spn")?;
    Ok(Json(vec![engine.spn(&spn)?.clone()]))
}

/// The raw parameter value; ids are matched exactly, so nothing is trimmed
fn required(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ApiError::MissingParam(field))
}

/// Lookup endpoint errors
#[derive(Debug)]
pub enum ApiError {
    MissingParam(&'static str),
    Lookup(LookupError),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError::Lookup(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Plain text, as existing clients expect
            ApiError::MissingParam(field) => {
                let article = if field == "spn" { "an" } else { "a" };
                let message = format!(
                    "Error: No {} field provided. Please specify {} {}.",
                    field, article, field
                );
                let response = (StatusCode::BAD_REQUEST, message).into_response();
                Rejection("missing_param").attach(response)
            }
            ApiError::Lookup(err) => {
                debug!("Lookup failed: {}", err);
                let (status, rejection) = match err {
                    LookupError::PgnNotFound(_) | LookupError::SpnNotFound(_) => {
                        (StatusCode::NOT_FOUND, Rejection("not_found"))
                    }
                    LookupError::Unresolved { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, Rejection("unresolved"))
                    }
                };
                let body = Json(json!({ "message": err.to_string() }));
                rejection.attach((status, body).into_response())
            }
        }
    }
}
