//! CoffeeScript preprocessor.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::command::Cmd;
use super::{CompileOptions, Preprocessor};
use crate::build::BuildError;
use crate::preferences::{Preferences, JS_BARE, JS_COFFEE_PATH};

/// Compiles `.coffee` sources to JavaScript with the `coffee` executable.
#[derive(Debug)]
pub struct ScriptPreprocessor {
    preferences: Arc<Preferences>,
}

impl ScriptPreprocessor {
    pub fn new(preferences: Arc<Preferences>) -> Self {
        Self { preferences }
    }

}

#[async_trait]
impl Preprocessor for ScriptPreprocessor {
    fn name(&self) -> &str {
        "coffee"
    }

    fn to_extension(&self) -> &str {
        "js"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["coffee"]
    }

    fn content_type(&self) -> &'static str {
        "text/javascript; charset=utf-8"
    }

    fn options(&self) -> CompileOptions {
        let mut flags = vec!["--print", "--compile"];
        if self.preferences.get_bool(JS_BARE, false) {
            flags.push("--bare");
        }
        CompileOptions::new(self.preferences.get_str(JS_COFFEE_PATH, "coffee"), flags)
    }

    async fn compile(&self, source: &Path, options: &CompileOptions) -> Result<Vec<u8>, BuildError> {
        Cmd::new(options.program.as_str()).args(&options.args).arg(source).output().await
    }
}
