//! Config validation: prefix shape and view-flag references.

use crate::config::RestApiConfig;
use crate::error::ConfigError;
use crate::view::ViewRegistry;
use std::collections::HashMap;

/// A `restapi` section after validation: normalized prefix and view flags keyed by exposed name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatedRestApi {
    pub prefix: String,
    pub view_flags: HashMap<String, bool>,
}

/// Normalized prefix: `""` when absent, otherwise starts with `/` and has no trailing `/`.
pub fn validate_prefix(prefix: Option<&str>) -> Result<String, ConfigError> {
    match prefix {
        None | Some("") => Ok(String::new()),
        Some(p) if p.starts_with('/') && !p.ends_with('/') => Ok(p.to_string()),
        Some(p) => Err(ConfigError::InvalidPrefix(p.to_string())),
    }
}

/// Every key in `restapi.views` must name a registered view, and at most one key
/// (exposed name or its camelCase alias) may refer to each view.
pub fn validate(config: &RestApiConfig, registry: &ViewRegistry) -> Result<ValidatedRestApi, ConfigError> {
    let prefix = validate_prefix(config.prefix.as_deref())?;
    let mut view_flags = HashMap::with_capacity(config.views.len());
    for (key, &enabled) in &config.views {
        let view = registry
            .lookup(key)
            .ok_or_else(|| ConfigError::UnknownView(key.clone()))?;
        if view_flags.insert(view.exposed_name.clone(), enabled).is_some() {
            return Err(ConfigError::DuplicateViewName(view.exposed_name.clone()));
        }
    }
    Ok(ValidatedRestApi { prefix, view_flags })
}
