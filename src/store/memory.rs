//! In-process document store with CouchDB response shapes. Views are Rust map closures.

use crate::error::StoreError;
use crate::store::{is_internal_id, DocumentStore, ViewRow, WriteResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// View map function: called once per document, returns the emitted `(key, value)` pairs.
pub type MapFn = Arc<dyn Fn(&Value) -> Vec<(Value, Value)> + Send + Sync>;

#[derive(Default)]
struct Inner {
    /// Live documents keyed by id; iteration order is the listing order.
    docs: BTreeMap<String, Value>,
    /// Last revision generation of deleted ids, so recreation continues the sequence.
    tombstones: HashMap<String, u64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    views: RwLock<HashMap<String, MapFn>>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Registers a map function under a canonical view path (`_design/<doc>/_view/<name>`).
    pub async fn define_view<F>(&self, path: impl Into<String>, map: F)
    where
        F: Fn(&Value) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.views.write().await.insert(path.into(), Arc::new(map));
    }

    /// The next backend call fails with `Unavailable`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner
            .read()
            .await
            .docs
            .keys()
            .filter(|id| !is_internal_id(id))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_fault(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

fn generation(rev: &str) -> u64 {
    rev.split('-')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn next_rev(previous: u64) -> String {
    format!("{}-{}", previous + 1, Uuid::new_v4().simple())
}

/// Stored layout: `_id`, `_rev`, then the remaining fields in their original order.
fn stored_document(id: &str, rev: &str, fields: Map<String, Value>) -> Value {
    let mut doc = Map::with_capacity(fields.len() + 2);
    doc.insert("_id".into(), Value::String(id.to_string()));
    doc.insert("_rev".into(), Value::String(rev.to_string()));
    for (k, v) in fields {
        if k != "_id" && k != "_rev" {
            doc.insert(k, v);
        }
    }
    Value::Object(doc)
}

fn rev_of(doc: &Value) -> &str {
    doc.get("_rev").and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, include_docs: bool) -> Result<Value, StoreError> {
        self.check_fault()?;
        let inner = self.inner.read().await;
        let rows: Vec<Value> = inner
            .docs
            .iter()
            .filter(|(id, _)| !is_internal_id(id))
            .map(|(id, doc)| {
                let mut row = json!({
                    "id": id,
                    "key": id,
                    "value": { "rev": rev_of(doc) },
                });
                if include_docs {
                    row["doc"] = doc.clone();
                }
                row
            })
            .collect();
        Ok(json!({
            "total_rows": rows.len(),
            "offset": 0,
            "rows": rows,
        }))
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        self.check_fault()?;
        Ok(self.inner.read().await.docs.get(id).cloned())
    }

    async fn query_view(&self, path: &str, key: &Value) -> Result<Vec<ViewRow>, StoreError> {
        self.check_fault()?;
        let map = self
            .views
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::MalformedView(path.to_string()))?;
        let inner = self.inner.read().await;
        let mut rows = Vec::new();
        for (id, doc) in inner.docs.iter().filter(|(id, _)| !is_internal_id(id)) {
            for (emitted_key, value) in map(doc) {
                if &emitted_key == key {
                    rows.push(ViewRow {
                        id: id.clone(),
                        key: emitted_key,
                        value,
                    });
                }
            }
        }
        Ok(rows)
    }

    async fn put(&self, doc: Value) -> Result<WriteResult, StoreError> {
        self.check_fault()?;
        let Value::Object(fields) = doc else {
            return Err(StoreError::InvalidDocument("document must be a JSON object".into()));
        };
        let id = match fields.get("_id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => return Err(StoreError::InvalidDocument("_id must be a non-empty string".into())),
            None => Uuid::new_v4().simple().to_string(),
        };
        let given_rev = fields.get("_rev").and_then(Value::as_str).map(str::to_string);

        let mut inner = self.inner.write().await;
        let current_rev = inner.docs.get(&id).map(|d| rev_of(d).to_string());
        let previous = match current_rev {
            Some(current_rev) => {
                if given_rev.as_deref() != Some(current_rev.as_str()) {
                    return Err(StoreError::Conflict(id));
                }
                generation(&current_rev)
            }
            None => {
                if given_rev.is_some() {
                    return Err(StoreError::Conflict(id));
                }
                inner.tombstones.remove(&id).unwrap_or(0)
            }
        };
        let rev = next_rev(previous);
        inner
            .docs
            .insert(id.clone(), stored_document(&id, &rev, fields));
        Ok(WriteResult { id, rev })
    }

    async fn delete(&self, id: &str, rev: &str) -> Result<WriteResult, StoreError> {
        self.check_fault()?;
        let mut inner = self.inner.write().await;
        let Some(current_rev) = inner.docs.get(id).map(|d| rev_of(d).to_string()) else {
            if inner.tombstones.contains_key(id) {
                return Err(StoreError::Deleted(id.to_string()));
            }
            return Err(StoreError::NotFound);
        };
        if current_rev != rev {
            return Err(StoreError::Conflict(id.to_string()));
        }
        inner.docs.remove(id);
        let generation = generation(&current_rev) + 1;
        inner.tombstones.insert(id.to_string(), generation);
        Ok(WriteResult {
            id: id.to_string(),
            rev: format!("{}-{}", generation, Uuid::new_v4().simple()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_assigns_id_and_increments_revision() {
        let store = MemoryStore::new();
        let created = store.put(json!({ "value": "one" })).await.unwrap();
        assert!(!created.id.is_empty());
        assert!(created.rev.starts_with("1-"));

        let updated = store
            .put(json!({ "_id": created.id, "_rev": created.rev, "value": "uno" }))
            .await
            .unwrap();
        assert!(updated.rev.starts_with("2-"));

        let doc = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(doc["value"], "uno");
        assert_eq!(doc["_rev"], updated.rev.as_str());
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = MemoryStore::new();
        let first = store.put(json!({ "_id": "a" })).await.unwrap();
        store
            .put(json!({ "_id": "a", "_rev": first.rev }))
            .await
            .unwrap();
        let err = store
            .put(json!({ "_id": "a", "_rev": first.rev }))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict("a".into()));
        assert_eq!(
            store.put(json!({ "_id": "a" })).await.unwrap_err(),
            StoreError::Conflict("a".into())
        );
    }

    #[tokio::test]
    async fn listing_skips_design_documents() {
        let store = MemoryStore::new();
        store.put(json!({ "_id": "_design/article", "views": {} })).await.unwrap();
        store.put(json!({ "_id": "b", "value": 2 })).await.unwrap();
        store.put(json!({ "_id": "a", "value": 1 })).await.unwrap();

        let listing = store.list_all(false).await.unwrap();
        assert_eq!(listing["total_rows"], 2);
        assert_eq!(listing["offset"], 0);
        assert_eq!(listing["rows"][0]["id"], "a");
        assert_eq!(listing["rows"][1]["key"], "b");
        assert!(listing["rows"][0].get("doc").is_none());

        let with_docs = store.list_all(true).await.unwrap();
        assert_eq!(with_docs["rows"][1]["doc"]["value"], 2);
    }

    #[tokio::test]
    async fn view_rows_filter_by_key_in_id_order() {
        let store = MemoryStore::new();
        store
            .define_view("_design/article/_view/by_tag", |doc| {
                doc.get("tags")
                    .and_then(Value::as_array)
                    .map(|tags| tags.iter().map(|t| (t.clone(), doc.clone())).collect())
                    .unwrap_or_default()
            })
            .await;
        store.put(json!({ "_id": "2", "tags": ["even"] })).await.unwrap();
        store.put(json!({ "_id": "1", "tags": ["odd"] })).await.unwrap();
        store.put(json!({ "_id": "4", "tags": ["even"] })).await.unwrap();

        let rows = store
            .query_view("_design/article/_view/by_tag", &json!("even"))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["2", "4"]);

        assert!(matches!(
            store.query_view("_design/article/_view/missing", &json!("x")).await,
            Err(StoreError::MalformedView(_))
        ));
    }

    #[tokio::test]
    async fn delete_then_recreate_continues_revisions() {
        let store = MemoryStore::new();
        let w = store.put(json!({ "_id": "gone" })).await.unwrap();
        let d = store.delete("gone", &w.rev).await.unwrap();
        assert!(d.rev.starts_with("2-"));
        assert_eq!(store.get("gone").await.unwrap(), None);
        assert_eq!(
            store.delete("gone", &d.rev).await.unwrap_err(),
            StoreError::Deleted("gone".into())
        );
        let again = store.put(json!({ "_id": "gone" })).await.unwrap();
        assert!(again.rev.starts_with("3-"));
    }

    #[tokio::test]
    async fn injected_failure_affects_one_call() {
        let store = MemoryStore::new();
        store.fail_next();
        assert!(matches!(store.list_all(false).await, Err(StoreError::Unavailable(_))));
        assert!(store.list_all(false).await.is_ok());
    }
}
