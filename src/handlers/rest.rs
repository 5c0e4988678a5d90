//! The `onRequest` handler: hands method and path to the dispatcher.

use crate::dispatch::Dispatcher;
use axum::{
    extract::State,
    http::{Method, Uri},
    response::Response,
};

pub async fn on_request(State(dispatcher): State<Dispatcher>, method: Method, uri: Uri) -> Response {
    dispatcher.on_request(&method, uri.path()).await
}
