//! Preprocessor registry.
//!
//! # Responsibilities
//! - Collect preprocessors in registration order
//! - Reject duplicate extensions and synthetic parameter collisions
//! - Freeze into an immutable list shared by the generator and router
//!
//! # Design Decisions
//! - Builder pattern: `Registry` has no mutators once built
//! - Registration order is match-priority order for the router

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::Preprocessor;

/// Configuration errors detected while freezing the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("preprocessor `{name}` has an empty extension")]
    EmptyExtension { name: String },

    #[error("preprocessors `{first}` and `{second}` both intercept `.{extension}`")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },

    #[error("query var `{var}` is claimed by both `{first}` and `{second}`")]
    QueryVarCollision {
        var: String,
        first: String,
        second: String,
    },
}

/// Ordered, immutable set of registered preprocessors.
#[derive(Debug, Default)]
pub struct Registry {
    preprocessors: Vec<Arc<dyn Preprocessor>>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Preprocessors in registration order.
    pub fn list(&self) -> &[Arc<dyn Preprocessor>] {
        &self.preprocessors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Preprocessor>> {
        self.preprocessors.iter()
    }

    /// Output extensions in registration order.
    pub fn extensions(&self) -> Vec<&str> {
        self.preprocessors.iter().map(|p| p.to_extension()).collect()
    }

    pub fn len(&self) -> usize {
        self.preprocessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preprocessors.is_empty()
    }
}

/// Accumulates preprocessors before validation.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    preprocessors: Vec<Arc<dyn Preprocessor>>,
}

impl RegistryBuilder {
    /// Append one preprocessor.
    pub fn register(mut self, preprocessor: Arc<dyn Preprocessor>) -> Self {
        self.preprocessors.push(preprocessor);
        self
    }

    /// Append several preprocessors, keeping their order.
    pub fn register_all<I>(mut self, preprocessors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Preprocessor>>,
    {
        self.preprocessors.extend(preprocessors);
        self
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut extensions: HashMap<&str, &str> = HashMap::new();
        let mut vars: HashMap<String, String> = HashMap::new();

        for p in &self.preprocessors {
            let extension = p.to_extension();
            if extension.is_empty() {
                return Err(RegistryError::EmptyExtension { name: p.name().to_string() });
            }
            if let Some(first) = extensions.insert(extension, p.name()) {
                return Err(RegistryError::DuplicateExtension {
                    extension: extension.to_string(),
                    first: first.to_string(),
                    second: p.name().to_string(),
                });
            }

            let params = p.params();
            for var in [params.flag, params.url] {
                if let Some(first) = vars.insert(var.clone(), p.name().to_string()) {
                    return Err(RegistryError::QueryVarCollision {
                        var,
                        first,
                        second: p.name().to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            count = self.preprocessors.len(),
            extensions = ?self.preprocessors.iter().map(|p| p.to_extension()).collect::<Vec<_>>(),
            "Preprocessor registry built"
        );

        Ok(Registry { preprocessors: self.preprocessors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildError;
    use crate::preprocessor::CompileOptions;
    use async_trait::async_trait;
    use std::path::Path;

    #[derive(Debug)]
    struct Fake {
        name: &'static str,
        ext: &'static str,
    }

    #[async_trait]
    impl Preprocessor for Fake {
        fn name(&self) -> &str {
            self.name
        }
        fn to_extension(&self) -> &str {
            self.ext
        }
        fn supported_extensions(&self) -> &[&'static str] {
            &["src"]
        }
        fn content_type(&self) -> &'static str {
            "text/plain"
        }
        async fn compile(&self, _source: &Path, _options: &CompileOptions) -> Result<Vec<u8>, BuildError> {
            Ok(Vec::new())
        }
    }

    fn fake(name: &'static str, ext: &'static str) -> Arc<dyn Preprocessor> {
        Arc::new(Fake { name, ext })
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = Registry::builder()
            .register(fake("sass", "css"))
            .register_all([fake("coffee", "js"), fake("md", "html")])
            .build()
            .unwrap();

        assert_eq!(registry.extensions(), vec!["css", "js", "html"]);
        assert_eq!(registry.list()[1].name(), "coffee");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_extension_is_rejected() {
        let err = Registry::builder()
            .register(fake("sass", "css"))
            .register(fake("less", "css"))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateExtension {
                extension: "css".into(),
                first: "sass".into(),
                second: "less".into(),
            }
        );
    }

    #[test]
    fn test_sanitized_name_collision_is_rejected() {
        // `c-s` and `c_s` both map to `preprocess_c_s`.
        let err = Registry::builder()
            .register(fake("a", "c-s"))
            .register(fake("b", "c_s"))
            .build()
            .unwrap_err();

        assert!(matches!(err, RegistryError::QueryVarCollision { ref var, .. } if var == "preprocess_c_s"));
    }

    #[test]
    fn test_empty_extension_is_rejected() {
        let err = Registry::builder().register(fake("blank", "")).build().unwrap_err();
        assert_eq!(err, RegistryError::EmptyExtension { name: "blank".into() });
    }
}
