//! Manifest finalizer.
//!
//! Merges the static descriptor with computed fields and writes it as
//! the build's entry descriptor. Strictly the last step of a successful
//! build: it names files the bundle writer and inliner produced.
//! Computed keys always win over same-named static keys; everything
//! else passes through unchanged.

use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::BuildError;
use crate::mode::BuildMode;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const NAME_FALLBACK: &str = "Please provide plugin name";

/// Merge the static descriptor with the computed reserved keys
/// `main`, `ui`, `name`, `id`.
pub fn finalize_manifest(
    static_manifest: &Value,
    mode: BuildMode,
    main_file: &str,
    ui_file: &str,
) -> Value {
    let mut merged: Map<String, Value> = match static_manifest {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    // Mirrors the JS `||` fallbacks: empty strings count as absent.
    let static_name = merged
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(NAME_FALLBACK)
        .to_string();
    let static_id = merged
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("")
        .to_string();

    merged.insert("main".to_string(), json!(main_file));
    merged.insert("ui".to_string(), json!(ui_file));
    merged.insert(
        "name".to_string(),
        json!(format!("{} — {}", mode.badge(), static_name)),
    );
    merged.insert("id".to_string(), json!(static_id));

    Value::Object(merged)
}

pub fn write_manifest(out_dir: &Path, manifest: &Value) -> Result<PathBuf, BuildError> {
    let path = out_dir.join(MANIFEST_FILE);
    let data = serde_json::to_string(manifest).map_err(|e| BuildError::ManifestWrite {
        path: path.clone(),
        source: e.into(),
    })?;
    fs::write(&path, data).map_err(|source| BuildError::ManifestWrite {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), "manifest written");
    Ok(path)
}

/// Load the static descriptor. A missing file is an empty descriptor;
/// malformed JSON is a configuration error.
pub fn load_static_manifest(path: &Path) -> Result<Value, BuildError> {
    if !path.is_file() {
        return Ok(json!({}));
    }
    let raw = fs::read_to_string(path).map_err(|source| BuildError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), e)))
}
