//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use asset_preprocessor::build::BuildError;
use asset_preprocessor::config::AppConfig;
use asset_preprocessor::http::HttpServer;
use asset_preprocessor::preprocessor::{CompileOptions, Preprocessor, Registry};
use asset_preprocessor::Preferences;

pub const THEME_PREFIX: &str = "/wp-content/themes/demo";

/// A theme directory on disk:
///
/// ```text
/// <root>/readme.txt
/// <root>/theme/assets/stylesheets/app.scss
/// ```
pub struct Theme {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Theme {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let theme = Self { dir };
        theme.write("readme.txt", "plain file");
        theme.write("theme/assets/stylesheets/app.scss", "body { color: red }");
        theme
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.theme.site_url = "http://localhost".into();
        config.theme.theme_url = format!("http://localhost{THEME_PREFIX}");
        config.theme.template_directory = self.root().to_path_buf();
        config
    }

    /// URL of a theme-relative path.
    pub fn url(&self, relative: &str) -> String {
        format!("{THEME_PREFIX}/{relative}")
    }
}

/// Upper-cases its source; counts compiles.
#[derive(Debug)]
pub struct Upper {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

#[allow(dead_code)]
impl Upper {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Preprocessor for Upper {
    fn name(&self) -> &str {
        "upper"
    }

    fn to_extension(&self) -> &str {
        "css"
    }

    fn supported_extensions(&self) -> &[&'static str] {
        &["scss"]
    }

    fn content_type(&self) -> &'static str {
        "text/css; charset=utf-8"
    }

    async fn compile(&self, source: &Path, _options: &CompileOptions) -> Result<Vec<u8>, BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let text = tokio::fs::read_to_string(source).await?;
        Ok(text.to_uppercase().into_bytes())
    }
}

/// Server for `config` with `upper` as the only preprocessor.
pub fn server_with(config: AppConfig, upper: Arc<Upper>) -> HttpServer {
    let registry = Registry::builder().register(upper).build().unwrap();
    HttpServer::new(config, Arc::new(registry), Arc::new(Preferences::new())).unwrap()
}
