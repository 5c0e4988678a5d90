//! Response shaping for the REST surface. No envelopes: every route answers in the shape
//! the database itself would, so clients can swap between the two.

use crate::entity::Entity;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Native all-documents listing, passed through untouched.
pub fn listing(native: Value) -> Response {
    (StatusCode::OK, Json(native)).into_response()
}

/// Raw stored document.
pub fn document(doc: Value) -> Response {
    (StatusCode::OK, Json(doc)).into_response()
}

/// Find-one result: the entity's value-object projection.
pub fn entity(entity: &Entity) -> Response {
    (StatusCode::OK, Json(entity.to_value_object())).into_response()
}
