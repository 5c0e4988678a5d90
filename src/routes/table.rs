//! Route table: which REST routes a model exposes, built once from `restapi` config.
//! Also owns path matching, since the table knows the prefix and the view names.

use crate::config::{validate, RestApiConfig};
use crate::error::{AppError, ConfigError};
use crate::view::ViewRegistry;
use axum::http::Method;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// `GET /`: all-documents listing.
    Index,
    /// `GET /{id}`: one raw document.
    ById,
    /// `GET /{view}/{key}`: first row of a view, by exposed view name.
    ViewQuery(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    pub kind: RouteKind,
    pub enabled: bool,
}

/// Result of matching a request path: the route shape plus the key segment, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMatch {
    pub kind: RouteKind,
    pub key: Option<String>,
}

/// Immutable after construction; shared read-only across requests.
#[derive(Clone, Debug)]
pub struct RouteTable {
    prefix: String,
    entries: HashMap<RouteKind, RouteEntry>,
}

impl RouteTable {
    /// `Ok(None)` when there is no `restapi` config: the model exposes no HTTP surface.
    pub fn build(config: Option<&RestApiConfig>, registry: &ViewRegistry) -> Result<Option<Self>, ConfigError> {
        let Some(config) = config else {
            return Ok(None);
        };
        let validated = validate(config, registry)?;

        let mut entries = HashMap::new();
        entries.insert(
            RouteKind::Index,
            RouteEntry {
                kind: RouteKind::Index,
                enabled: config.index,
            },
        );
        entries.insert(
            RouteKind::ById,
            RouteEntry {
                kind: RouteKind::ById,
                enabled: config.by_id,
            },
        );
        for view in registry.iter() {
            let enabled = validated
                .view_flags
                .get(&view.exposed_name)
                .copied()
                .unwrap_or(false);
            let kind = RouteKind::ViewQuery(view.exposed_name.clone());
            entries.insert(kind.clone(), RouteEntry { kind, enabled });
        }

        let table = RouteTable {
            prefix: validated.prefix,
            entries,
        };
        tracing::info!(
            prefix = %table.prefix,
            index = config.index,
            by_id = config.by_id,
            views = ?table.enabled_views(),
            "rest routes built"
        );
        Ok(Some(table))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entry(&self, kind: &RouteKind) -> Option<&RouteEntry> {
        self.entries.get(kind)
    }

    pub fn is_enabled(&self, kind: &RouteKind) -> bool {
        self.entry(kind).map(|e| e.enabled).unwrap_or(false)
    }

    pub fn enabled_views(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .values()
            .filter(|e| e.enabled)
            .filter_map(|e| match &e.kind {
                RouteKind::ViewQuery(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names
    }

    fn is_enabled_view(&self, name: &str) -> bool {
        self.is_enabled(&RouteKind::ViewQuery(name.to_string()))
    }

    /// Maps method + path to a route shape. Any mismatch is `RouteNotFound`.
    /// Enabled view names win over id lookups for single-segment paths.
    pub fn match_request(&self, method: &Method, path: &str) -> Result<RouteMatch, AppError> {
        let rest = strip_prefix(path, &self.prefix).ok_or(AppError::RouteNotFound)?;
        if *method != Method::GET {
            return Err(AppError::RouteNotFound);
        }
        let trimmed = rest.trim_matches('/');
        let segments: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        };

        match segments.as_slice() {
            [] => Ok(RouteMatch {
                kind: RouteKind::Index,
                key: None,
            }),
            [segment] => {
                let segment = decode_segment(segment)?;
                if self.is_enabled_view(&segment) {
                    // A view needs a key; the bare view name is not addressable.
                    return Err(AppError::RouteNotFound);
                }
                Ok(RouteMatch {
                    kind: RouteKind::ById,
                    key: Some(segment),
                })
            }
            [view, key] => Ok(RouteMatch {
                kind: RouteKind::ViewQuery(decode_segment(view)?),
                key: Some(decode_segment(key)?),
            }),
            _ => Err(AppError::RouteNotFound),
        }
    }

    /// Absent and disabled entries are both forbidden.
    pub fn authorize(&self, route: &RouteMatch) -> Result<(), AppError> {
        if self.is_enabled(&route.kind) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Remainder of `path` under `prefix`, which must end at a segment boundary.
fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Percent-decodes one path segment. Stray `%` bytes pass through as-is; a result
/// that is not UTF-8 does not route.
fn decode_segment(segment: &str) -> Result<String, AppError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| AppError::RouteNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;

    fn registry() -> ViewRegistry {
        ViewRegistry::from_config(&[
            ViewConfig::Path("_design/article/_view/by_date".into()),
            ViewConfig::Spec {
                path: "_design/article/_view/by_tag".into(),
                name: Some("by_one_of_the_tags".into()),
            },
            ViewConfig::Path("_design/article/_view/by_slug".into()),
        ])
        .unwrap()
    }

    fn rest(prefix: Option<&str>, index: bool, by_id: bool, views: &[(&str, bool)]) -> RestApiConfig {
        RestApiConfig {
            prefix: prefix.map(str::to_string),
            index,
            by_id,
            views: views.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn table(config: RestApiConfig) -> RouteTable {
        RouteTable::build(Some(&config), &registry()).unwrap().unwrap()
    }

    fn get(table: &RouteTable, path: &str) -> Result<RouteMatch, AppError> {
        table.match_request(&Method::GET, path)
    }

    #[test]
    fn absent_config_means_no_table() {
        assert!(RouteTable::build(None, &registry()).unwrap().is_none());
    }

    #[test]
    fn one_entry_per_view_defaulting_to_disabled() {
        let t = table(rest(None, false, true, &[("bySlug", true), ("byOneOfTheTags", false)]));
        assert!(!t.is_enabled(&RouteKind::Index));
        assert!(t.is_enabled(&RouteKind::ById));
        assert!(t.is_enabled(&RouteKind::ViewQuery("by_slug".into())));
        assert!(!t.is_enabled(&RouteKind::ViewQuery("by_one_of_the_tags".into())));
        let by_date = t.entry(&RouteKind::ViewQuery("by_date".into())).unwrap();
        assert!(!by_date.enabled);
        assert_eq!(t.enabled_views(), ["by_slug"]);
    }

    #[test]
    fn build_rejects_bad_prefix_and_unknown_views() {
        let err = RouteTable::build(Some(&rest(Some("/x/"), true, false, &[])), &registry()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPrefix("/x/".into()));
        let err = RouteTable::build(Some(&rest(None, false, false, &[("byAuthor", true)])), &registry())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownView("byAuthor".into()));
    }

    #[test]
    fn name_and_alias_flags_for_one_view_are_rejected() {
        let config = rest(None, false, false, &[("by_slug", false), ("bySlug", true)]);
        for _ in 0..16 {
            let err = RouteTable::build(Some(&config), &registry()).unwrap_err();
            assert_eq!(err, ConfigError::DuplicateViewName("by_slug".into()));
        }
    }

    #[test]
    fn view_flags_resolve_through_aliases() {
        let t = table(rest(None, false, false, &[("byOneOfTheTags", true), ("by_slug", false)]));
        assert!(t.is_enabled(&RouteKind::ViewQuery("by_one_of_the_tags".into())));
        assert!(!t.is_enabled(&RouteKind::ViewQuery("by_slug".into())));
        assert_eq!(t.prefix(), "");
    }

    #[test]
    fn matches_each_shape() {
        let t = table(rest(None, true, true, &[("by_slug", true)]));
        assert_eq!(get(&t, "/").unwrap().kind, RouteKind::Index);
        assert_eq!(get(&t, "").unwrap().kind, RouteKind::Index);
        assert_eq!(
            get(&t, "/second").unwrap(),
            RouteMatch {
                kind: RouteKind::ById,
                key: Some("second".into())
            }
        );
        assert_eq!(
            get(&t, "/by_slug/test_article_one_slug/").unwrap(),
            RouteMatch {
                kind: RouteKind::ViewQuery("by_slug".into()),
                key: Some("test_article_one_slug".into())
            }
        );
        assert!(matches!(get(&t, "/a/b/c"), Err(AppError::RouteNotFound)));
        assert!(matches!(get(&t, "/a//b"), Err(AppError::RouteNotFound)));
    }

    #[test]
    fn non_get_methods_do_not_route() {
        let t = table(rest(None, true, true, &[]));
        assert!(matches!(t.match_request(&Method::POST, "/"), Err(AppError::RouteNotFound)));
        assert!(matches!(t.match_request(&Method::DELETE, "/x"), Err(AppError::RouteNotFound)));
    }

    #[test]
    fn enabled_view_name_shadows_id() {
        let t = table(rest(None, false, true, &[("by_slug", true)]));
        assert!(matches!(get(&t, "/by_slug"), Err(AppError::RouteNotFound)));
        // A disabled view name is an ordinary id.
        assert_eq!(get(&t, "/by_date").unwrap().kind, RouteKind::ById);
    }

    #[test]
    fn prefix_must_match_on_segment_boundary() {
        let t = table(rest(Some("/testmodel"), true, true, &[]));
        assert_eq!(get(&t, "/testmodel").unwrap().kind, RouteKind::Index);
        assert_eq!(get(&t, "/testmodel/").unwrap().kind, RouteKind::Index);
        assert_eq!(get(&t, "/testmodel/abc").unwrap().key.as_deref(), Some("abc"));
        assert!(matches!(get(&t, "/"), Err(AppError::RouteNotFound)));
        assert!(matches!(get(&t, "/testmodelx"), Err(AppError::RouteNotFound)));
        assert!(matches!(get(&t, "/other/abc"), Err(AppError::RouteNotFound)));
    }

    #[test]
    fn keys_are_percent_decoded() {
        let t = table(rest(None, false, true, &[("by_one_of_the_tags", true)]));
        assert_eq!(get(&t, "/a%20b").unwrap().key.as_deref(), Some("a b"));
        assert_eq!(
            get(&t, "/by_one_of_the_tags/caf%C3%A9").unwrap().key.as_deref(),
            Some("café")
        );
        assert_eq!(get(&t, "/bad%2").unwrap().key.as_deref(), Some("bad%2"));
        assert_eq!(get(&t, "/bad%zz").unwrap().key.as_deref(), Some("bad%zz"));
        assert!(matches!(get(&t, "/bad%FF"), Err(AppError::RouteNotFound)));
        assert!(matches!(get(&t, "/by_one_of_the_tags/%C3"), Err(AppError::RouteNotFound)));
    }

    #[test]
    fn authorize_rejects_disabled_and_unknown_routes() {
        let t = table(rest(None, false, true, &[("bySlug", true)]));
        let index = get(&t, "/").unwrap();
        assert!(matches!(t.authorize(&index), Err(AppError::Forbidden)));
        let by_id = get(&t, "/x").unwrap();
        assert!(t.authorize(&by_id).is_ok());
        let tags = get(&t, "/by_one_of_the_tags/even").unwrap();
        assert!(matches!(t.authorize(&tags), Err(AppError::Forbidden)));
        let unknown = get(&t, "/nope/even").unwrap();
        assert!(matches!(t.authorize(&unknown), Err(AppError::Forbidden)));
    }
}
