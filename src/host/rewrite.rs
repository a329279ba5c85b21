//! Rewrite rules: URL pattern → synthetic query parameters.
//!
//! # Responsibilities
//! - Compile `pattern → index?key=value&...` rules
//! - Keep top-priority rules ahead of every bottom-priority rule
//! - Expand `$n` captures into parameter values for the first matching rule
//!
//! # Design Decisions
//! - Targets are split into key/value pairs at construction; captures are
//!   substituted per value, so a captured path containing `&` or `=` cannot
//!   inject extra parameters
//! - Insertion order decides among rules of the same priority

use std::fmt;

use regex::Regex;
use url::form_urlencoded;

/// Where a rule is placed relative to the rest of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Evaluated before every bottom rule.
    Top,
    /// Evaluated after every top rule (host permalink rules).
    Bottom,
}

/// One compiled rewrite rule.
#[derive(Clone)]
pub struct RewriteRule {
    pattern: Regex,
    target: String,
    params: Vec<(String, String)>,
}

impl RewriteRule {
    /// Compile `pattern` and split `target` (`index?k=v&k2=$1`) into parameters.
    pub fn new(pattern: &str, target: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern)?;
        let query = target.split_once('?').map_or("", |(_, q)| q);
        let params = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Ok(Self {
            pattern,
            target: target.to_string(),
            params,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Parameter names this rule sets.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Expanded parameters if `path` matches.
    pub fn apply(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.pattern.captures(path)?;
        Some(
            self.params
                .iter()
                .map(|(key, template)| {
                    let mut value = String::new();
                    captures.expand(template, &mut value);
                    (key.clone(), value)
                })
                .collect(),
        )
    }
}

impl fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteRule")
            .field("pattern", &self.pattern.as_str())
            .field("target", &self.target)
            .finish()
    }
}

/// Ordered rewrite table.
#[derive(Debug, Clone, Default)]
pub struct RewriteTable {
    top: Vec<RewriteRule>,
    bottom: Vec<RewriteRule>,
}

/// Result of rewriting one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Pattern of the rule that matched.
    pub pattern: String,
    pub params: Vec<(String, String)>,
}

impl RewriteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: RewriteRule, priority: Priority) {
        match priority {
            Priority::Top => self.top.push(rule),
            Priority::Bottom => self.bottom.push(rule),
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &RewriteRule> {
        self.top.iter().chain(self.bottom.iter())
    }

    pub fn len(&self) -> usize {
        self.top.len() + self.bottom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the first matching rule.
    pub fn rewrite(&self, path: &str) -> Option<Rewrite> {
        self.rules().find_map(|rule| {
            rule.apply(path).map(|params| Rewrite {
                pattern: rule.pattern().to_string(),
                params,
            })
        })
    }
}
