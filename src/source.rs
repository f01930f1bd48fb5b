//! Source files and static reference discovery.
//!
//! A `SourceFile` is immutable once read: identity is the resolved
//! path, and its reference list is discovered up front by scanning
//! import statements in the raw content. Only relative specifiers
//! become references; bare (package) specifiers are outside the graph.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::BuildError;

lazy_static! {
    static ref JS_IMPORT_RE: Regex =
        Regex::new(r#"(?m)^\s*import\s+(?:[^'"\n]+?from\s+)?["']([^"']+)["']"#).unwrap();
    static ref CSS_AT_IMPORT_RE: Regex =
        Regex::new(r#"(?m)^\s*@import\s+["']([^"']+)["']"#).unwrap();
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Extension with the leading dot, e.g. ".ts".
    pub extension: String,
    pub content: String,
    /// Other source files this one statically imports, fully resolved.
    pub references: Vec<PathBuf>,
}

impl SourceFile {
    /// Read a file and discover its references. `resolve_extensions`
    /// are the candidates tried, in order, for extensionless relative
    /// specifiers.
    pub fn read(path: &Path, resolve_extensions: &[String]) -> Result<Self, BuildError> {
        let content = fs::read_to_string(path).map_err(|source| BuildError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let references = discover_references(&content, base_dir, resolve_extensions)?;

        Ok(SourceFile {
            path: path.to_path_buf(),
            extension,
            content,
            references,
        })
    }
}

fn discover_references(
    content: &str,
    base_dir: &Path,
    resolve_extensions: &[String],
) -> Result<Vec<PathBuf>, BuildError> {
    let mut references = Vec::new();

    for re in [&*JS_IMPORT_RE, &*CSS_AT_IMPORT_RE] {
        for cap in re.captures_iter(content) {
            let specifier = &cap[1];
            if !specifier.starts_with("./") && !specifier.starts_with("../") {
                debug!(specifier, "skipping bare specifier");
                continue;
            }
            let resolved = resolve_reference(base_dir, specifier, resolve_extensions)?;
            if !references.contains(&resolved) {
                references.push(resolved);
            }
        }
    }

    Ok(references)
}

/// Resolve a relative specifier against the referencing file's
/// directory, trying the specifier as written first and then each
/// candidate extension in order.
fn resolve_reference(
    base_dir: &Path,
    specifier: &str,
    resolve_extensions: &[String],
) -> Result<PathBuf, BuildError> {
    let joined = base_dir.join(specifier);
    if joined.is_file() {
        return normalize(&joined);
    }
    for ext in resolve_extensions {
        let candidate = PathBuf::from(format!("{}{}", joined.display(), ext));
        if candidate.is_file() {
            return normalize(&candidate);
        }
    }
    Err(BuildError::SourceRead {
        path: joined,
        source: io::Error::new(
            io::ErrorKind::NotFound,
            format!("unresolved import \"{}\"", specifier),
        ),
    })
}

/// Canonicalize so the same file reached through different relative
/// paths keys a single graph node.
pub fn normalize(path: &Path) -> Result<PathBuf, BuildError> {
    fs::canonicalize(path).map_err(|source| BuildError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}
