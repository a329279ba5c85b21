//! Routing table: rewrite rules plus the recognized-parameter allow-list.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::form_urlencoded;

use super::rewrite::{Priority, RewriteRule, RewriteTable};
use crate::config::HostConfig;
use crate::preprocessor::Registry;
use crate::routing::{query_vars, rules};

/// Configuration errors detected while building the routing table.
#[derive(Debug, Error)]
pub enum RoutingTableError {
    #[error("invalid rewrite pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("query var `{0}` is both a host parameter and a preprocessor parameter")]
    QueryVarCollision(String),
}

/// A request after rewriting and parameter parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Percent-decoded request path.
    pub path: String,
    /// Recognized parameters only.
    pub query_vars: HashMap<String, String>,
    /// Pattern of the rewrite rule that matched, if any.
    pub matched_rule: Option<String>,
}

impl ParsedRequest {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.query_vars.get(name).map(String::as_str)
    }

    /// Present and not empty, `0` or `false`.
    pub fn is_truthy(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| !matches!(v, "" | "0" | "false"))
    }
}

/// Immutable routing state, rebuilt as a whole on configuration reload.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rewrites: RewriteTable,
    query_vars: Vec<String>,
}

impl RoutingTable {
    /// Host rules at bottom priority, asset interception rules at top,
    /// host allow-list extended with every preprocessor's parameters.
    pub fn build(host: &HostConfig, registry: &Registry) -> Result<Self, RoutingTableError> {
        let mut rewrites = RewriteTable::new();
        for rule in &host.rewrite {
            let compiled = RewriteRule::new(&rule.pattern, &rule.target).map_err(|source| {
                RoutingTableError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            rewrites.add_rule(compiled, Priority::Bottom);
        }

        rules::register_assets_rewrite_rules(&mut rewrites, registry).map_err(|source| {
            RoutingTableError::InvalidPattern {
                pattern: "<asset rule>".to_string(),
                source,
            }
        })?;

        for p in registry.iter() {
            let params = p.params();
            for name in [&params.flag, &params.url] {
                if host.query_vars.contains(name) {
                    return Err(RoutingTableError::QueryVarCollision(name.clone()));
                }
            }
        }
        let query_vars = query_vars::query_vars(registry, host.query_vars.clone());

        tracing::info!(
            rules = rewrites.len(),
            query_vars = query_vars.len(),
            "Routing table built"
        );

        Ok(Self { rewrites, query_vars })
    }

    pub fn query_vars(&self) -> &[String] {
        &self.query_vars
    }

    pub fn rewrites(&self) -> &RewriteTable {
        &self.rewrites
    }

    /// Rewrite `path`, merge it with the query string, and drop unrecognized parameters.
    ///
    /// Parameters produced by the rewrite take precedence over the query string.
    pub fn parse_request(&self, path: &str, query: Option<&str>) -> ParsedRequest {
        let path = percent_decode_str(path).decode_utf8_lossy().into_owned();

        let mut vars: HashMap<String, String> = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let rewrite = self.rewrites.rewrite(&path);
        let matched_rule = rewrite.map(|r| {
            vars.extend(r.params);
            r.pattern
        });

        vars.retain(|name, _| self.query_vars.contains(name));

        ParsedRequest {
            path,
            query_vars: vars,
            matched_rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RewriteRuleConfig;
    use crate::preferences::Preferences;
    use crate::preprocessor::PreprocessorKind;
    use std::sync::Arc;

    fn registry() -> Registry {
        let prefs = Arc::new(Preferences::new());
        Registry::builder()
            .register(PreprocessorKind::Stylesheet.instantiate(prefs.clone()))
            .register(PreprocessorKind::Script.instantiate(prefs))
            .build()
            .unwrap()
    }

    fn host() -> HostConfig {
        HostConfig {
            query_vars: vec!["pagename".into(), "s".into()],
            rewrite: vec![RewriteRuleConfig {
                pattern: r"^/(.+?)/?$".into(),
                target: "index?pagename=$1".into(),
            }],
        }
    }

    #[test]
    fn test_asset_request_sets_flag_and_url() {
        let table = RoutingTable::build(&host(), &registry()).unwrap();
        let parsed = table.parse_request("/wp-content/themes/demo/theme/assets/app.css", None);

        assert!(parsed.is_truthy("preprocess_css"));
        assert_eq!(
            parsed.get("preprocess_css_original_url"),
            Some("/wp-content/themes/demo/theme/assets/app.css")
        );
        assert!(parsed.get("pagename").is_none(), "catch-all permalink rule must not win");
        assert_eq!(table.query_vars().len(), 6);
    }

    #[test]
    fn test_unrecognized_params_are_dropped() {
        let table = RoutingTable::build(&host(), &registry()).unwrap();
        let parsed = table.parse_request("/about/", Some("s=rust&utm_source=feed"));

        assert_eq!(parsed.get("pagename"), Some("about"));
        assert_eq!(parsed.get("s"), Some("rust"));
        assert!(parsed.get("utm_source").is_none());
        assert!(parsed.matched_rule.is_some());
    }

    #[test]
    fn test_rewrite_overrides_query_string() {
        let table = RoutingTable::build(&host(), &registry()).unwrap();
        let parsed = table.parse_request("/a.css", Some("preprocess_css_original_url=/etc/passwd.css"));
        assert_eq!(parsed.get("preprocess_css_original_url"), Some("/a.css"));
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let table = RoutingTable::build(&host(), &registry()).unwrap();
        let parsed = table.parse_request("/theme/assets/my%20app.css", None);
        assert_eq!(parsed.get("preprocess_css_original_url"), Some("/theme/assets/my app.css"));
    }

    #[test]
    fn test_host_param_collision_is_rejected() {
        let mut host = host();
        host.query_vars.push("preprocess_js".into());
        let err = RoutingTable::build(&host, &registry()).unwrap_err();
        assert!(matches!(err, RoutingTableError::QueryVarCollision(ref v) if v == "preprocess_js"));
    }

    #[test]
    fn test_invalid_host_pattern_is_rejected() {
        let mut host = host();
        host.rewrite.push(RewriteRuleConfig {
            pattern: "(unclosed".into(),
            target: "index?p=1".into(),
        });
        assert!(matches!(
            RoutingTable::build(&host, &registry()),
            Err(RoutingTableError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_truthiness() {
        let parsed = ParsedRequest {
            query_vars: HashMap::from([
                ("a".to_string(), "true".to_string()),
                ("b".to_string(), "0".to_string()),
                ("c".to_string(), String::new()),
            ]),
            ..Default::default()
        };
        assert!(parsed.is_truthy("a"));
        assert!(!parsed.is_truthy("b"));
        assert!(!parsed.is_truthy("c"));
        assert!(!parsed.is_truthy("missing"));
    }
}
