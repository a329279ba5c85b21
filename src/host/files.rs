//! Existing-file check run before any rewriting.
//!
//! A request for a regular file that exists under the template directory is
//! served as-is. Rewrite rules, the asset intercept rules included, only see
//! requests that do not map to such a file.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;

use crate::config::ThemeConfig;

/// Maps request paths under the theme URL onto the template directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFiles {
    url_prefix: String,
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(url_prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            root: root.into(),
        }
    }

    pub fn from_config(theme: &ThemeConfig) -> Self {
        Self::new(theme.theme_url_prefix(), theme.template_directory.clone())
    }

    /// Filesystem location for a raw request path, if it lies under the theme URL.
    ///
    /// `.`/`..` segments and embedded NULs or backslashes never map to a file.
    pub fn local_path(&self, raw_path: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(raw_path).decode_utf8().ok()?;
        let url: Vec<&str> = decoded.split('/').filter(|s| !s.is_empty()).collect();
        if url.iter().any(|s| *s == "." || *s == ".." || s.contains(['\\', '\0'])) {
            return None;
        }

        let prefix: Vec<&str> = self.url_prefix.split('/').filter(|s| !s.is_empty()).collect();
        let relative = url.strip_prefix(prefix.as_slice())?;
        if relative.is_empty() {
            return None;
        }
        Some(relative.iter().fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    /// Whether `raw_path` names a regular file on disk.
    pub async fn exists(&self, raw_path: &str) -> bool {
        let Some(path) = self.local_path(raw_path) else {
            return false;
        };
        tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}
