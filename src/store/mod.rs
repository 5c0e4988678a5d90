//! Backend collaborator: document persistence and view queries in the native CouchDB shapes.

mod memory;

pub use memory::{MapFn, MemoryStore};

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ids under these prefixes are backend-internal and never listed.
pub const DESIGN_PREFIX: &str = "_design/";
pub const LOCAL_PREFIX: &str = "_local/";

pub fn is_internal_id(id: &str) -> bool {
    id.starts_with(DESIGN_PREFIX) || id.starts_with(LOCAL_PREFIX)
}

/// One row of a view result, field order as the backend emits it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    pub id: String,
    pub key: Value,
    pub value: Value,
}

/// Outcome of a successful write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub id: String,
    pub rev: String,
}

/// Everything the model and the REST dispatcher need from the database.
/// Implementations own connection handling, retries and timeouts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Native all-documents listing: `{"total_rows", "offset", "rows": [{"id", "key", "value": {"rev"}}]}`,
    /// with each row's `doc` attached when `include_docs` is set.
    async fn list_all(&self, include_docs: bool) -> Result<Value, StoreError>;

    /// The stored document, or `None` if the id is unknown or deleted.
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError>;

    /// Rows of the view at `path` whose key equals `key`.
    async fn query_view(&self, path: &str, key: &Value) -> Result<Vec<ViewRow>, StoreError>;

    /// Insert (no `_rev`) or update (current `_rev`) a document. Assigns `_id` if absent.
    async fn put(&self, doc: Value) -> Result<WriteResult, StoreError>;

    async fn delete(&self, id: &str, rev: &str) -> Result<WriteResult, StoreError>;
}
