//! REST router. Every path lands on the dispatcher, which does its own matching
//! so that prefix and view-name precedence rules stay in one place.

use crate::dispatch::Dispatcher;
use crate::handlers::on_request;
use axum::Router;

pub fn rest_routes(dispatcher: Dispatcher) -> Router {
    Router::new().fallback(on_request).with_state(dispatcher)
}
