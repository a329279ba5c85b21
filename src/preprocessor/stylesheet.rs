//! Sass/SCSS stylesheet preprocessor.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::command::Cmd;
use super::{CompileOptions, Preprocessor};
use crate::build::BuildError;
use crate::preferences::{Preferences, CSS_OUTPUT_STYLE, CSS_SASS_PATH};

/// Compiles `.scss`/`.sass` sources to CSS with the `sass` executable.
#[derive(Debug)]
pub struct StylesheetPreprocessor {
    preferences: Arc<Preferences>,
}

impl StylesheetPreprocessor {
    pub fn new(preferences: Arc<Preferences>) -> Self {
        Self { preferences }
    }

}

#[async_trait]
impl Preprocessor for StylesheetPreprocessor {
    fn name(&self) -> &str {
        "sass"
    }

    fn to_extension(&self) -> &str {
        "css"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["scss", "sass"]
    }

    fn content_type(&self) -> &'static str {
        "text/css; charset=utf-8"
    }

    fn options(&self) -> CompileOptions {
        CompileOptions::new(
            self.preferences.get_str(CSS_SASS_PATH, "sass"),
            [
                "--no-source-map".to_string(),
                format!("--style={}", self.preferences.get_str(CSS_OUTPUT_STYLE, "expanded")),
            ],
        )
    }

    async fn compile(&self, source: &Path, options: &CompileOptions) -> Result<Vec<u8>, BuildError> {
        let mut cmd = Cmd::new(options.program.as_str()).args(&options.args);
        if let Some(dir) = source.parent() {
            cmd = cmd.arg(format!("--load-path={}", dir.display())).cwd(dir);
        }
        cmd.arg(source).output().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_track_preferences() {
        let prefs = Arc::new(Preferences::new());
        let sass = StylesheetPreprocessor::new(prefs.clone());
        let before = sass.options();
        assert_eq!(before.fingerprint(), "sass --no-source-map --style=expanded");

        prefs.set(CSS_OUTPUT_STYLE, "compressed");
        prefs.set(CSS_SASS_PATH, json!("/opt/dart-sass/sass"));
        assert_eq!(
            sass.options().fingerprint(),
            "/opt/dart-sass/sass --no-source-map --style=compressed"
        );
        assert_eq!(before.fingerprint(), "sass --no-source-map --style=expanded");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compile_invokes_configured_program() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("app.scss");
        std::fs::write(&source, "a { b: c }").unwrap();

        // `echo` stands in for sass and prints the argument list it was given.
        let prefs = Arc::new(Preferences::new());
        prefs.set(CSS_SASS_PATH, "echo");
        prefs.set(CSS_OUTPUT_STYLE, "compressed");
        let sass = StylesheetPreprocessor::new(prefs);
        let out = sass.compile(&source, &sass.options()).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("--no-source-map --style=compressed --load-path="));
        assert!(out.trim_end().ends_with(&source.display().to_string()));
    }
}
