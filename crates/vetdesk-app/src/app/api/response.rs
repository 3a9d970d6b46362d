//! JSON error shaping shared by the API handlers.
//!
//! Every failure body carries a stable `kind` (and `field` for validation
//! errors) next to the human-readable message, so clients dispatch on the
//! kind rather than matching message substrings.

use std::sync::Arc;

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response};
use serde::Serialize;
use tracing::error;

use vetdesk_db::store::RecordStore;
use vetdesk_service::error::ServiceError;

use crate::store_handler::get_store_from_depot;

/// Error response payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Renders a service error with the appropriate status code. Store
/// failures are logged and masked behind a generic message.
pub fn render_error(res: &mut Response, err: &ServiceError) {
    match err {
        ServiceError::NotFound(_) => {
            res.status_code(StatusCode::NOT_FOUND);
        }
        ServiceError::Store(inner) => {
            error!(error = %inner, "Record store failure");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorBody {
                error: "Internal server error".to_string(),
                kind: err.kind(),
                field: None,
            }));
            return;
        }
        _ => {
            res.status_code(StatusCode::BAD_REQUEST);
        }
    }
    res.render(Json(ErrorBody {
        error: err.to_string(),
        kind: err.kind(),
        field: err.field(),
    }));
}

/// Renders the standard 400 for a body that failed to deserialize.
pub fn render_bad_body(res: &mut Response) {
    res.status_code(StatusCode::BAD_REQUEST);
    res.render(Json(ErrorBody {
        error: "Invalid request body".to_string(),
        kind: "validation_error",
        field: None,
    }));
}

/// Fetches the record store injected by `StoreHandler`, rendering a 500
/// when it is missing.
pub fn obtain_store(depot: &Depot, res: &mut Response) -> Option<Arc<dyn RecordStore>> {
    match get_store_from_depot(depot) {
        Ok(store) => Some(store),
        Err(err) => {
            error!(error = ?err, "Failed to get record store");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render(Json(ErrorBody {
                error: "Internal server error".to_string(),
                kind: "store_error",
                field: None,
            }));
            None
        }
    }
}

/// Parses the `{id}` path parameter. An absent or non-UUID id renders the
/// same 404 an unknown id would.
pub fn parse_id(req: &Request, res: &mut Response, what: &'static str) -> Option<uuid::Uuid> {
    let Some(raw) = req.param::<String>("id") else {
        render_error(res, &ServiceError::NotFound(what));
        return None;
    };
    match uuid::Uuid::parse_str(&raw) {
        Ok(id) => Some(id),
        Err(_) => {
            render_error(res, &ServiceError::NotFound(what));
            None
        }
    }
}
