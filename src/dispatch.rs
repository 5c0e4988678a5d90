//! Request dispatcher: match, authorize, query, shape. One response per request.

use crate::error::AppError;
use crate::model::Model;
use crate::response;
use crate::routes::{RouteKind, RouteMatch, RouteTable};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Cheap to clone; holds only read-only shared state.
#[derive(Clone)]
pub struct Dispatcher {
    model: Model,
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    pub(crate) fn new(model: Model, routes: Arc<RouteTable>) -> Self {
        Dispatcher { model, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Handles one request. Failures become a status code; nothing is retried.
    pub async fn on_request(&self, method: &Method, path: &str) -> Response {
        let span = tracing::info_span!("rest_request", %method, path);
        async move {
            match self.dispatch(method, path).await {
                Ok(resp) => resp,
                Err(e) => {
                    let (status, _) = e.status();
                    if status == StatusCode::INTERNAL_SERVER_ERROR {
                        tracing::error!(error = %e, "request failed");
                    } else {
                        tracing::warn!(status = status.as_u16(), reason = %e, "request rejected");
                    }
                    e.into_response()
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Authorization runs before any backend call.
    pub async fn dispatch(&self, method: &Method, path: &str) -> Result<Response, AppError> {
        let route = self.routes.match_request(method, path)?;
        tracing::debug!(route = ?route.kind, key = ?route.key, "matched");
        self.routes.authorize(&route)?;
        self.execute(route).await
    }

    async fn execute(&self, route: RouteMatch) -> Result<Response, AppError> {
        let store = self.model.store();
        match route.kind {
            RouteKind::Index => {
                let listing = store.list_all(false).await?;
                Ok(response::listing(listing))
            }
            RouteKind::ById => {
                let id = route.key.ok_or(AppError::RouteNotFound)?;
                match store.get(&id).await? {
                    Some(doc) => Ok(response::document(doc)),
                    None => Err(AppError::NotFound(id)),
                }
            }
            RouteKind::ViewQuery(name) => {
                let key = route.key.ok_or(AppError::RouteNotFound)?;
                let path = self.model.views().resolve(&name)?;
                match self.model.find_one_at(path, &Value::String(key.clone())).await? {
                    Some(entity) => Ok(response::entity(&entity)),
                    None => Err(AppError::NotFound(format!("{}/{}", name, key))),
                }
            }
        }
    }
}
