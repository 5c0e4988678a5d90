//! Raw config types matching the model JSON (`views` + `restapi`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A view registration: a bare canonical path, or a path with an exposed name override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewConfig {
    Path(String),
    Spec {
        path: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl ViewConfig {
    pub fn path(&self) -> &str {
        match self {
            ViewConfig::Path(p) => p,
            ViewConfig::Spec { path, .. } => path,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ViewConfig::Path(_) => None,
            ViewConfig::Spec { name, .. } => name.as_deref(),
        }
    }
}

/// REST surface flags. Every route defaults to disabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiConfig {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub index: bool,
    #[serde(default, rename = "byID")]
    pub by_id: bool,
    /// Keyed by exposed view name or its camelCase alias.
    #[serde(default)]
    pub views: HashMap<String, bool>,
}

/// Everything the model consumes at construction time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub views: Vec<ViewConfig>,
    /// `None` (absent or `null`) means no HTTP surface at all.
    #[serde(default)]
    pub restapi: Option<RestApiConfig>,
}
