use node_core::ErrorKind;
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Wraps a ledger error so it can travel through warp's rejection channel.
/// Mapped to a status code in [`handle_rejection`] per spec.md §7's
/// kind-to-HTTP mapping.
#[derive(Debug)]
pub struct ApiRejection(pub node_core::Error);

impl warp::reject::Reject for ApiRejection {}

/// A rejection not backed by a ledger `Error` — malformed input the
/// ledger never sees, or an admission outcome already expressed as a
/// string reason.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl warp::reject::Reject for BadRequest {}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Converts a rejection into a JSON error response. Validation -> 400,
/// NotFound -> 404, everything else (Resource/Internal/Consensus) -> 500
/// (spec.md §7: "Validation errors map to 400, NotFound to 404,
/// Resource/Internal to 500"; Consensus is grouped with the 500s since it
/// reflects an engine-side failure, not a client mistake).
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(ApiRejection(e)) = err.find::<ApiRejection>() {
        let status = match e.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Resource | ErrorKind::Internal | ErrorKind::Consensus => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, e.to_string())
    } else if let Some(BadRequest(reason)) = err.find::<BadRequest>() {
        (StatusCode::BAD_REQUEST, reason.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}
