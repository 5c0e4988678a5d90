//! The document model: a store, its registered views, and the optional REST surface.

use crate::case::to_snake_case;
use crate::config::ModelConfig;
use crate::dispatch::Dispatcher;
use crate::entity::Entity;
use crate::error::{AppError, ConfigError, StoreError};
use crate::routes::{rest_routes, RouteTable};
use crate::store::{DocumentStore, ViewRow};
use crate::view::ViewRegistry;
use axum::Router;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct Model {
    store: Arc<dyn DocumentStore>,
    views: Arc<ViewRegistry>,
    routes: Option<Arc<RouteTable>>,
}

impl Model {
    /// Registers the configured views and builds the route table. Any config error aborts construction.
    pub fn new(store: Arc<dyn DocumentStore>, config: &ModelConfig) -> Result<Self, ConfigError> {
        let views = ViewRegistry::from_config(&config.views)?;
        let routes = RouteTable::build(config.restapi.as_ref(), &views)?;
        tracing::info!(
            views = views.len(),
            rest = routes.is_some(),
            "model created"
        );
        Ok(Model {
            store,
            views: Arc::new(views),
            routes: routes.map(Arc::new),
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn route_table(&self) -> Option<&RouteTable> {
        self.routes.as_deref()
    }

    /// Request dispatcher, or `None` when the model has no REST surface.
    pub fn dispatcher(&self) -> Option<Dispatcher> {
        let routes = self.routes.clone()?;
        Some(Dispatcher::new(self.clone(), routes))
    }

    /// axum router serving the REST surface, or `None` when the model has none.
    pub fn router(&self) -> Option<Router> {
        self.dispatcher().map(rest_routes)
    }

    /// Unsaved entity; nothing is written until [`Model::save`].
    pub fn create(&self, fields: Map<String, Value>) -> Entity {
        Entity::new(fields)
    }

    /// Inserts or updates. Identity and revision are refreshed in place.
    pub async fn save(&self, entity: &mut Entity) -> Result<(), AppError> {
        if entity.is_deleted() {
            return Err(AppError::EntityDeleted);
        }
        let written = self
            .store
            .put(entity.to_document())
            .await
            .map_err(write_error)?;
        tracing::debug!(id = %written.id, rev = %written.rev, "entity saved");
        entity.mark_saved(written.id, written.rev);
        Ok(())
    }

    /// Deletes with the current revision. The entity stays usable for reads but rejects writes.
    pub async fn remove(&self, entity: &mut Entity) -> Result<(), AppError> {
        if entity.is_deleted() {
            return Err(AppError::EntityDeleted);
        }
        let (Some(id), Some(rev)) = (entity.id(), entity.rev()) else {
            return Err(AppError::BadRequest("entity has not been saved".into()));
        };
        let written = self.store.delete(id, rev).await.map_err(write_error)?;
        tracing::debug!(id = %written.id, "entity removed");
        entity.mark_deleted(written.rev);
        Ok(())
    }

    pub async fn find_one_by_id(&self, id: &str) -> Result<Option<Entity>, AppError> {
        match self.store.get(id).await? {
            Some(doc) => Ok(Some(Entity::from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Every non-design document, in listing order.
    pub async fn find_all(&self) -> Result<Vec<Entity>, AppError> {
        let listing = self.store.list_all(true).await?;
        let rows = listing
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::InvalidDocument("listing without rows".into()))?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let doc = row
                .get("doc")
                .cloned()
                .ok_or_else(|| StoreError::InvalidDocument("listing row without doc".into()))?;
            out.push(Entity::from_document(doc)?);
        }
        Ok(out)
    }

    /// All entities a view emits for `key`. `view` is an exposed name or its camelCase alias.
    pub async fn find_by(&self, view: &str, key: impl Into<Value>) -> Result<Vec<Entity>, AppError> {
        let path = self.view_path(view)?;
        let rows = self.store.query_view(path, &key.into()).await?;
        rows.into_iter()
            .map(|row| entity_from_row(row).map_err(AppError::from))
            .collect()
    }

    /// First entity a view emits for `key`.
    pub async fn find_one_by(&self, view: &str, key: impl Into<Value>) -> Result<Option<Entity>, AppError> {
        let path = self.view_path(view)?;
        self.find_one_at(path, &key.into()).await
    }

    pub(crate) async fn find_one_at(&self, path: &str, key: &Value) -> Result<Option<Entity>, AppError> {
        let rows = self.store.query_view(path, key).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(entity_from_row(row)?)),
            None => Ok(None),
        }
    }

    /// `find_by_<view>` / `find_one_by_<view>` names for each registered view,
    /// with a leading `by_` folded in (`by_slug` gives `find_by_slug`).
    pub fn accessor_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.views.len() * 2);
        for view in self.views.iter() {
            let snake = to_snake_case(&view.exposed_name);
            let stem = snake.strip_prefix("by_").unwrap_or(&snake);
            names.push(format!("find_by_{}", stem));
            names.push(format!("find_one_by_{}", stem));
        }
        names
    }

    fn view_path(&self, view: &str) -> Result<&str, AppError> {
        self.views
            .lookup(view)
            .map(|v| v.canonical_path.as_str())
            .ok_or_else(|| ConfigError::UnknownView(view.to_string()).into())
    }
}

/// The row's value is the document; its id falls back to the row id when the view emitted a partial value.
fn entity_from_row(row: ViewRow) -> Result<Entity, StoreError> {
    let mut value = row.value;
    if let Value::Object(map) = &mut value {
        if !map.contains_key("_id") {
            map.insert("_id".into(), Value::String(row.id));
        }
    }
    Entity::from_document(value)
}

fn write_error(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(id) => AppError::Conflict(id),
        StoreError::Deleted(_) => AppError::EntityDeleted,
        other => AppError::Backend(other),
    }
}
