//! couch-model: entity layer over a CouchDB-style document store, with an optional
//! REST surface mirroring the database's own responses.

pub mod case;
pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod store;
pub mod view;

pub use config::{load_from_env, load_from_file, load_from_str, ModelConfig, RestApiConfig, ViewConfig};
pub use dispatch::Dispatcher;
pub use entity::{Entity, EntityState};
pub use error::{AppError, ConfigError, StoreError};
pub use model::Model;
pub use routes::{rest_routes, RouteKind, RouteTable};
pub use store::{DocumentStore, MemoryStore, ViewRow, WriteResult};
pub use view::{ViewDescriptor, ViewRegistry};
