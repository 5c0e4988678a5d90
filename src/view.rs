//! View registry: the queryable views known to a model, keyed by exposed name.

use crate::case::same_identifier;
use crate::config::ViewConfig;
use crate::error::ConfigError;
use std::collections::HashMap;

/// A backend view and the name it is exposed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewDescriptor {
    /// Design-document view path, e.g. `_design/article/_view/by_date`.
    pub canonical_path: String,
    /// Used in REST paths and accessor names, e.g. `by_date`.
    pub exposed_name: String,
}

impl ViewDescriptor {
    /// Exposed name defaults to the last path segment.
    pub fn new(canonical_path: impl Into<String>, name: Option<&str>) -> Self {
        let canonical_path = canonical_path.into();
        let exposed_name = match name {
            Some(n) => n.to_string(),
            None => canonical_path
                .rsplit('/')
                .next()
                .unwrap_or(canonical_path.as_str())
                .to_string(),
        };
        ViewDescriptor {
            canonical_path,
            exposed_name,
        }
    }
}

impl From<&ViewConfig> for ViewDescriptor {
    fn from(config: &ViewConfig) -> Self {
        ViewDescriptor::new(config.path(), config.name())
    }
}

/// Populated during model construction, read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ViewRegistry {
    views: Vec<ViewDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        ViewRegistry::default()
    }

    pub fn from_config(views: &[ViewConfig]) -> Result<Self, ConfigError> {
        let mut registry = ViewRegistry::new();
        for v in views {
            registry.register(v.into())?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ViewDescriptor) -> Result<(), ConfigError> {
        if self.by_name.contains_key(&descriptor.exposed_name) {
            return Err(ConfigError::DuplicateViewName(descriptor.exposed_name));
        }
        self.by_name
            .insert(descriptor.exposed_name.clone(), self.views.len());
        self.views.push(descriptor);
        Ok(())
    }

    pub fn register_path(&mut self, canonical_path: &str, name: Option<&str>) -> Result<(), ConfigError> {
        self.register(ViewDescriptor::new(canonical_path, name))
    }

    /// Canonical backend path for an exposed name.
    pub fn resolve(&self, exposed_name: &str) -> Result<&str, ConfigError> {
        self.by_name
            .get(exposed_name)
            .map(|&i| self.views[i].canonical_path.as_str())
            .ok_or_else(|| ConfigError::UnknownView(exposed_name.to_string()))
    }

    /// Exact exposed name first, then the camelCase alias (`bySlug` for `by_slug`).
    pub fn lookup(&self, name: &str) -> Option<&ViewDescriptor> {
        if let Some(&i) = self.by_name.get(name) {
            return Some(&self.views[i]);
        }
        self.views
            .iter()
            .find(|v| same_identifier(&v.exposed_name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewDescriptor> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
