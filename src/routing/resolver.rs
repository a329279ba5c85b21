//! Path resolution: requested URL → (source path, compiled output path, cache directory).
//!
//! # Responsibilities
//! - Strip the theme URL prefix from the requested URL
//! - Mirror the remaining URL under the template directory (compiled output)
//! - Re-root the part below the assets directory under the assets root (source)
//!
//! # Design Decisions
//! - Pure: no filesystem access, same input always yields the same paths
//! - Works on `/`-separated segments, never on substring matches
//! - Rejects `.`/`..` segments instead of normalizing them

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ThemeConfig;

/// Name of the directory segment that marks the start of the assets tree.
const ASSETS_SEGMENT: &str = "assets";

/// Requests that cannot be mapped onto the theme tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathResolutionError {
    #[error("`{url}` is outside the theme URL `{prefix}`")]
    MissingThemePrefix { url: String, prefix: String },

    #[error("`{url}` does not point into the theme assets directory")]
    MissingAssetsSegment { url: String },

    #[error("`{url}` contains a relative path segment")]
    Traversal { url: String },
}

/// Paths computed for one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Source location without the source extension (the build step appends it).
    pub source_file_path: PathBuf,
    /// Where the compiled artifact lives, mirroring the public URL layout.
    pub compiled_output_path: PathBuf,
    /// Directory holding compiled results keyed by source hash.
    pub cache_directory: PathBuf,
}

/// Theme layout inputs to [`resolve`], captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayout {
    /// Theme base URL with the site base URL removed (e.g. `/wp-content/themes/demo`).
    pub theme_url_prefix: String,
    pub template_directory: String,
    pub assets_directory: String,
    pub cache_directory: String,
    /// Reject URLs that do not start with `theme_url_prefix`.
    pub require_theme_prefix: bool,
}

impl ThemeLayout {
    pub fn from_config(theme: &ThemeConfig) -> Self {
        Self {
            theme_url_prefix: theme.theme_url_prefix(),
            template_directory: theme.template_directory.to_string_lossy().into_owned(),
            assets_directory: theme.assets_path().to_string_lossy().into_owned(),
            cache_directory: theme.temp_path().to_string_lossy().into_owned(),
            require_theme_prefix: theme.require_theme_prefix,
        }
    }

    /// Segments of the assets directory relative to the template directory, if nested in it.
    fn assets_anchor(&self) -> Option<Vec<&str>> {
        let template = segments(&self.template_directory);
        let assets = segments(&self.assets_directory);
        assets.starts_with(&template).then(|| assets[template.len()..].to_vec())
    }
}

/// Resolve `original_url` for a preprocessor intercepting `.{extension}`.
pub fn resolve(
    original_url: &str,
    layout: &ThemeLayout,
    extension: &str,
) -> Result<ResolvedPaths, PathResolutionError> {
    let url = segments(original_url);
    if url.iter().any(|s| *s == "." || *s == "..") {
        return Err(PathResolutionError::Traversal { url: original_url.to_string() });
    }

    let prefix = segments(&layout.theme_url_prefix);
    let relative: &[&str] = if url.starts_with(&prefix) {
        &url[prefix.len()..]
    } else if layout.require_theme_prefix {
        return Err(PathResolutionError::MissingThemePrefix {
            url: original_url.to_string(),
            prefix: layout.theme_url_prefix.clone(),
        });
    } else {
        &url
    };

    let compiled_output_path = join_paths(&[layout.template_directory.as_str(), relative.join("/").as_str()]);

    let asset_relative = strip_assets_root(relative, layout).ok_or_else(|| {
        PathResolutionError::MissingAssetsSegment { url: original_url.to_string() }
    })?;
    let source = join_paths(&[layout.assets_directory.as_str(), asset_relative.join("/").as_str()]);
    let source = strip_extension(&source, extension);

    Ok(ResolvedPaths {
        source_file_path: PathBuf::from(source),
        compiled_output_path: PathBuf::from(compiled_output_path),
        cache_directory: PathBuf::from(&layout.cache_directory),
    })
}

/// The part of `relative` below the assets root.
///
/// When the assets directory sits inside the template directory its exact
/// position anchors the split, so a nested directory also named `assets`
/// stays part of the asset path. Otherwise everything through the rightmost
/// `assets` segment is dropped.
fn strip_assets_root<'a>(relative: &'a [&'a str], layout: &ThemeLayout) -> Option<&'a [&'a str]> {
    if let Some(anchor) = layout.assets_anchor() {
        if !anchor.is_empty() && relative.starts_with(&anchor) {
            return Some(&relative[anchor.len()..]).filter(|rest| !rest.is_empty());
        }
    }
    let pos = relative.iter().rposition(|s| *s == ASSETS_SEGMENT)?;
    Some(&relative[pos + 1..]).filter(|rest| !rest.is_empty())
}

fn strip_extension<'a>(path: &'a str, extension: &str) -> &'a str {
    path.strip_suffix(extension)
        .and_then(|p| p.strip_suffix('.'))
        .unwrap_or(path)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join path fragments with single slashes.
///
/// Slashes at each fragment's edges are trimmed and empty fragments skipped.
/// The result is absolute only if the *first* fragment was.
pub fn join_paths<S: AsRef<str>>(parts: &[S]) -> String {
    let Some(first) = parts.first() else {
        return String::new();
    };
    let joined = parts
        .iter()
        .map(|p| p.as_ref().trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if first.as_ref().starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}
