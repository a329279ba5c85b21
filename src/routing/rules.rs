//! Interception rule generation.
//!
//! One top-priority rewrite rule per preprocessor: any path ending in
//! `.<ext>` is rewritten to the preprocessor's flag and url parameters.

use crate::host::rewrite::{Priority, RewriteRule, RewriteTable};
use crate::preprocessor::{Preprocessor, Registry};

/// The interception rule for a single preprocessor.
pub fn intercept_rule(preprocessor: &dyn Preprocessor) -> Result<RewriteRule, regex::Error> {
    let params = preprocessor.params();
    let pattern = format!(r"(?s)^(.*\.{})$", regex::escape(preprocessor.to_extension()));
    let target = format!("index?{}=true&{}=$1", params.flag, params.url);
    RewriteRule::new(&pattern, &target)
}

/// Interception rules for every registered preprocessor, in registration order.
pub fn assets_rewrite_rules(registry: &Registry) -> Result<Vec<RewriteRule>, regex::Error> {
    registry.iter().map(|p| intercept_rule(p.as_ref())).collect()
}

/// Add the interception rules to `table` ahead of its existing rules.
pub fn register_assets_rewrite_rules(table: &mut RewriteTable, registry: &Registry) -> Result<(), regex::Error> {
    for rule in assets_rewrite_rules(registry)? {
        tracing::debug!(pattern = rule.pattern(), target = rule.target(), "Registering asset rewrite rule");
        table.add_rule(rule, Priority::Top);
    }
    Ok(())
}
