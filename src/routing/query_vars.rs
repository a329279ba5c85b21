//! Query var multiplexing.
//!
//! Extends the host's recognized-parameter allow-list with the flag and url
//! parameters of every preprocessor, so request parsing keeps them.

use crate::preprocessor::Registry;

/// Return `vars` with both synthetic parameters of each preprocessor appended.
///
/// Names already present are not added again, so repeated calls are no-ops.
pub fn query_vars(registry: &Registry, mut vars: Vec<String>) -> Vec<String> {
    for preprocessor in registry.iter() {
        let params = preprocessor.params();
        for name in [params.flag, params.url] {
            if !vars.contains(&name) {
                vars.push(name);
            }
        }
    }
    vars
}
