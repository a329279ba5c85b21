//! Preprocessor subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     [preprocessors] config → PreprocessorKind::instantiate
//!     → registry.rs (validate, freeze in registration order)
//!     → shared via Arc with the rewrite generator and request router
//!
//! Per matched request:
//!     build::Builder locates the source via supported_extensions()
//!     → Preprocessor::compile (external compiler via command.rs)
//! ```
//!
//! # Design Decisions
//! - Preprocessors are trait objects constructed by the caller; no lookup by name
//! - The output extension is the identity: it keys interception and parameter names
//! - Compiler options are snapshotted from `Preferences` once per build

pub mod command;
pub mod registry;
pub mod script;
pub mod stylesheet;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::build::BuildError;
use crate::preferences::Preferences;

pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use script::ScriptPreprocessor;
pub use stylesheet::StylesheetPreprocessor;

/// Prefix shared by every synthetic query parameter.
const QUERY_VAR_PREFIX: &str = "preprocess";

/// Suffix of the parameter carrying the originally requested URL.
pub const ORIGINAL_URL_SUFFIX: &str = "original_url";

/// A capability that compiles a source-format asset into a servable output.
#[async_trait]
pub trait Preprocessor: Send + Sync + fmt::Debug {
    /// Short name used in logs, metrics and cache keys.
    fn name(&self) -> &str;

    /// Extension of the served artifact (e.g. `css`). Requests ending in it are intercepted.
    fn to_extension(&self) -> &str;

    /// Source extensions, tried in order when locating the file to compile.
    fn supported_extensions(&self) -> &[&'static str];

    /// `Content-Type` of the compiled output.
    fn content_type(&self) -> &'static str;

    /// Snapshot of the compile options, taken once per build.
    ///
    /// The same snapshot keys the cache and drives [`Preprocessor::compile`].
    fn options(&self) -> CompileOptions {
        CompileOptions::default()
    }

    /// Deterministic synthetic parameter name, optionally suffixed.
    fn query_var_name(&self, suffix: Option<&str>) -> String {
        let ext: String = self
            .to_extension()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        match suffix {
            Some(suffix) => format!("{QUERY_VAR_PREFIX}_{ext}_{suffix}"),
            None => format!("{QUERY_VAR_PREFIX}_{ext}"),
        }
    }

    /// The flag/url parameter pair for this preprocessor.
    fn params(&self) -> SyntheticParams {
        SyntheticParams {
            flag: self.query_var_name(None),
            url: self.query_var_name(Some(ORIGINAL_URL_SUFFIX)),
        }
    }

    /// Compile `source` with `options` and return the output bytes.
    async fn compile(&self, source: &Path, options: &CompileOptions) -> Result<Vec<u8>, BuildError>;
}

/// Compiler program and arguments resolved from preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub program: String,
    pub args: Vec<String>,
}

impl CompileOptions {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Stable text form, folded into the cache key.
    pub fn fingerprint(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The two synthetic request parameters owned by one preprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyntheticParams {
    /// Set to `true` when the request needs this preprocessor.
    pub flag: String,
    /// Carries the original requested URL.
    pub url: String,
}

/// Preprocessor variants selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessorKind {
    /// Sass/SCSS → CSS.
    Stylesheet,
    /// CoffeeScript → JavaScript.
    Script,
}

impl PreprocessorKind {
    /// Construct the capability object for this kind.
    pub fn instantiate(self, preferences: Arc<Preferences>) -> Arc<dyn Preprocessor> {
        match self {
            PreprocessorKind::Stylesheet => Arc::new(StylesheetPreprocessor::new(preferences)),
            PreprocessorKind::Script => Arc::new(ScriptPreprocessor::new(preferences)),
        }
    }
}

impl fmt::Display for PreprocessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessorKind::Stylesheet => f.write_str("stylesheet"),
            PreprocessorKind::Script => f.write_str("script"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_var_names_are_derived_from_extension() {
        let prefs = Arc::new(Preferences::new());
        let css = PreprocessorKind::Stylesheet.instantiate(prefs.clone());
        let js = PreprocessorKind::Script.instantiate(prefs);

        assert_eq!(
            css.params(),
            SyntheticParams {
                flag: "preprocess_css".into(),
                url: "preprocess_css_original_url".into(),
            }
        );
        assert_eq!(js.query_var_name(None), "preprocess_js");
        assert_ne!(css.params(), js.params());
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kinds: Vec<PreprocessorKind>,
        }
        let parsed: Wrapper = toml::from_str(r#"kinds = ["script", "stylesheet"]"#).unwrap();
        assert_eq!(parsed.kinds, vec![PreprocessorKind::Script, PreprocessorKind::Stylesheet]);
    }
}
