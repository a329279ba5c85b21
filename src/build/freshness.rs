//! Source lookup, cache keys, cache file naming and atomic writes.
//!
//! Freshness is content-based: the cache key hashes the source bytes together
//! with the preprocessor's identity and compile options, so an unchanged
//! source maps to the same cache file across restarts.
//!
//! Cache files are named `<output-id>-<key>.<ext>`. The output id is derived
//! from the compiled output path, so the entries belonging to one output can
//! be found and pruned when a newer one is written.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::build::BuildError;
use crate::preprocessor::CompileOptions;

/// Hex characters of the output path hash kept in cache file names.
const OUTPUT_ID_LEN: usize = 16;

/// Find the first existing `<stem>.<ext>` among `extensions`.
pub async fn locate_source(stem: &Path, extensions: &[&str]) -> Result<PathBuf, BuildError> {
    let mut tried = Vec::with_capacity(extensions.len());
    for ext in extensions {
        let candidate = with_appended_extension(stem, ext);
        if tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
            return Ok(candidate);
        }
        tried.push(candidate.display().to_string());
    }
    Err(BuildError::SourceNotFound {
        stem: stem.to_path_buf(),
        tried,
    })
}

/// `app.css` + `scss` → `app.css.scss`; never replaces an existing extension.
fn with_appended_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Cache key for compiling `source` with the preprocessor `name` and `options`.
pub fn cache_key(name: &str, options: &CompileOptions, source: &Path, contents: &[u8]) -> String {
    let fingerprint = options.fingerprint();
    let mut hasher = blake3::Hasher::new();
    for part in [
        name.as_bytes(),
        fingerprint.as_bytes(),
        source.to_string_lossy().as_bytes(),
    ] {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Short stable id for a compiled output path.
pub fn output_id(output: &Path) -> String {
    let hash = blake3::hash(output.to_string_lossy().as_bytes()).to_hex();
    hash[..OUTPUT_ID_LEN].to_string()
}

/// `<cache_dir>/<output_id>-<key>.<ext>`.
pub fn cache_file(cache_dir: &Path, output_id: &str, key: &str, ext: &str) -> PathBuf {
    cache_dir.join(format!("{output_id}-{key}.{ext}"))
}

/// Remove every cache file of `output_id` except `keep`. Returns how many were removed.
///
/// Callers hold the output's build lock, so no other build writes these entries concurrently.
pub async fn prune_stale(cache_dir: &Path, output_id: &str, keep: &Path) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(cache_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let prefix = format!("{output_id}-");
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let owned = entry.file_name().to_string_lossy().starts_with(&prefix);
        if !owned || path == keep {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

/// Write via a sibling temp file and rename, creating parent directories.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    tokio::fs::create_dir_all(parent).await?;

    let mut tmp_name = OsString::from(".");
    tmp_name.push(path.file_name().unwrap_or_default());
    tmp_name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    let tmp = parent.join(tmp_name);

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
