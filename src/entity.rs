//! Entity: one document with identity, revision and free-form fields.

use crate::error::StoreError;
use serde_json::{Map, Value};

/// Where an entity is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityState {
    /// Constructed in memory, never written.
    New,
    Persisted,
    /// Removed from the backend; further writes fail.
    Deleted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: Option<String>,
    rev: Option<String>,
    fields: Map<String, Value>,
    state: EntityState,
}

impl Entity {
    /// Unsaved entity. `_id` and `_rev` keys are lifted out of `fields`.
    pub fn new(mut fields: Map<String, Value>) -> Self {
        let id = take_string(&mut fields, "_id");
        let rev = take_string(&mut fields, "_rev");
        Entity {
            id,
            rev,
            fields,
            state: EntityState::New,
        }
    }

    /// Entity for a document read back from the backend.
    pub fn from_document(doc: Value) -> Result<Self, StoreError> {
        match doc {
            Value::Object(map) => {
                let mut entity = Entity::new(map);
                entity.state = EntityState::Persisted;
                Ok(entity)
            }
            other => Err(StoreError::InvalidDocument(format!(
                "expected object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == EntityState::New
    }

    pub fn is_deleted(&self) -> bool {
        self.state == EntityState::Deleted
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a data field. `_id`/`_rev` are managed by the model and ignored here.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field == "_id" || field == "_rev" {
            return;
        }
        self.fields.insert(field, value);
    }

    pub fn remove_field(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(field)
    }

    pub(crate) fn mark_saved(&mut self, id: String, rev: String) {
        self.id = Some(id);
        self.rev = Some(rev);
        self.state = EntityState::Persisted;
    }

    pub(crate) fn mark_deleted(&mut self, rev: String) {
        self.rev = Some(rev);
        self.state = EntityState::Deleted;
    }

    /// The document as stored: `_id`, `_rev` (when known), then the fields in insertion order.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::with_capacity(self.fields.len() + 2);
        if let Some(id) = &self.id {
            doc.insert("_id".into(), Value::String(id.clone()));
        }
        if let Some(rev) = &self.rev {
            doc.insert("_rev".into(), Value::String(rev.clone()));
        }
        for (k, v) in &self.fields {
            doc.insert(k.clone(), v.clone());
        }
        Value::Object(doc)
    }

    /// Plain-data projection for the wire: identity, revision and fields, no lifecycle state.
    /// The REST find-one route and the in-process accessors both render through this.
    pub fn to_value_object(&self) -> Value {
        self.to_document()
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.shift_remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn new_lifts_identity_out_of_fields() {
        let e = Entity::new(object(json!({ "_id": "first", "value": "one" })));
        assert_eq!(e.id(), Some("first"));
        assert_eq!(e.rev(), None);
        assert!(e.is_new());
        assert_eq!(e.fields().len(), 1);
        assert_eq!(e.get("value"), Some(&json!("one")));
    }

    #[test]
    fn value_object_puts_identity_first() {
        let e = Entity::from_document(json!({
            "slug": "a",
            "_rev": "1-abc",
            "_id": "0",
        }))
        .unwrap();
        assert_eq!(e.state(), EntityState::Persisted);
        let vo = e.to_value_object();
        let keys: Vec<&str> = vo.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["_id", "_rev", "slug"]);
    }

    #[test]
    fn set_ignores_managed_keys() {
        let mut e = Entity::new(Map::new());
        e.set("_id", json!("sneaky"));
        e.set("title", json!("hello"));
        assert_eq!(e.id(), None);
        assert_eq!(e.to_document(), json!({ "title": "hello" }));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(matches!(
            Entity::from_document(json!([1, 2])),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn lifecycle_transitions() {
        let mut e = Entity::new(Map::new());
        e.mark_saved("x".into(), "1-a".into());
        assert_eq!(e.state(), EntityState::Persisted);
        e.mark_deleted("2-b".into());
        assert!(e.is_deleted());
        assert_eq!(e.rev(), Some("2-b"));
    }
}
