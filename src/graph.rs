//! Artifact graph builder.
//!
//! Walks the static reference graph from each bundle's declared entry
//! files, resolving and executing every reachable source file exactly
//! once per build, and assembles the resulting units into named entry
//! bundles. Traversal is a depth-first walk with an in-progress mark:
//! a back-edge to an in-progress node is a reference cycle and fails
//! the build.
//!
//! All traversal and transform work is pure with respect to the output
//! directory; the clean and write steps at the bottom of this module
//! are the only filesystem effects, and no write happens until every
//! bundle has fully assembled.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cache::IncrementalCache;
use crate::error::BuildError;
use crate::executor::{execute_chain, TransformRecord};
use crate::mode::BuildMode;
use crate::resolver::ChainRegistry;
use crate::source::{normalize, SourceFile};
use crate::stage::StageRegistry;

/// One named build output: final bundle code plus, when any side
/// artifacts were queued for standalone writing, a bundle stylesheet.
#[derive(Debug, Clone)]
pub struct EntryBundle {
    pub name: String,
    pub code: String,
    pub stylesheet: Option<String>,
}

/// A bundle's emitted files.
#[derive(Debug, Clone)]
pub struct WrittenBundle {
    pub name: String,
    pub files: Vec<PathBuf>,
}

struct UnitEntry {
    record: TransformRecord,
    references: Vec<PathBuf>,
    source_path: PathBuf,
    source_content: String,
}

enum VisitState {
    InProgress,
    Done,
}

pub struct GraphBuilder<'a> {
    registry: &'a ChainRegistry,
    stages: &'a StageRegistry,
    mode: BuildMode,
    cache: Option<&'a IncrementalCache>,
    resolve_extensions: &'a [String],
    /// Per-build unit map: a file shared by several bundles transforms
    /// once and is reused.
    units: HashMap<PathBuf, UnitEntry>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        registry: &'a ChainRegistry,
        stages: &'a StageRegistry,
        mode: BuildMode,
        cache: Option<&'a IncrementalCache>,
        resolve_extensions: &'a [String],
    ) -> Self {
        GraphBuilder {
            registry,
            stages,
            mode,
            cache,
            resolve_extensions,
            units: HashMap::new(),
        }
    }

    /// Number of distinct source files transformed so far.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Traverse from the bundle's entry files and assemble its final
    /// code (units concatenated in dependency order) and stylesheet.
    pub fn build_bundle(
        &mut self,
        name: &str,
        entry_files: &[PathBuf],
    ) -> Result<EntryBundle, BuildError> {
        let mut states: HashMap<PathBuf, VisitState> = HashMap::new();
        let mut order: Vec<PathBuf> = Vec::new();
        let mut trail: Vec<String> = Vec::new();

        for entry in entry_files {
            let path = normalize(entry)?;
            self.visit(&path, &mut states, &mut order, &mut trail)?;
        }

        let mut code_parts: Vec<&str> = Vec::new();
        let mut style_parts: Vec<&str> = Vec::new();
        for path in &order {
            let unit = &self.units[path];
            if !unit.record.code.trim().is_empty() {
                code_parts.push(&unit.record.code);
            }
            if let Some(css) = &unit.record.side_artifact {
                style_parts.push(css);
            }
        }

        let mut code = code_parts.join("\n");
        if self.mode.emit_source_maps() && !code.is_empty() {
            let units: Vec<&UnitEntry> = order.iter().map(|path| &self.units[path]).collect();
            code.push_str(&bundle_source_map(name, &units));
        }

        info!(bundle = name, files = order.len(), "bundle assembled");
        Ok(EntryBundle {
            name: name.to_string(),
            code,
            stylesheet: if style_parts.is_empty() {
                None
            } else {
                Some(style_parts.join("\n"))
            },
        })
    }

    fn visit(
        &mut self,
        path: &PathBuf,
        states: &mut HashMap<PathBuf, VisitState>,
        order: &mut Vec<PathBuf>,
        trail: &mut Vec<String>,
    ) -> Result<(), BuildError> {
        match states.get(path) {
            Some(VisitState::InProgress) => {
                let mut cycle = trail.clone();
                cycle.push(path.display().to_string());
                return Err(BuildError::CyclicReference { path: cycle });
            }
            Some(VisitState::Done) => return Ok(()),
            None => {}
        }
        states.insert(path.clone(), VisitState::InProgress);
        trail.push(path.display().to_string());

        let references = match self.units.get(path) {
            Some(unit) => unit.references.clone(),
            None => {
                let unit = self.transform(path)?;
                let references = unit.references.clone();
                self.units.insert(path.clone(), unit);
                references
            }
        };
        for reference in &references {
            self.visit(reference, states, order, trail)?;
        }

        trail.pop();
        states.insert(path.clone(), VisitState::Done);
        order.push(path.clone());
        Ok(())
    }

    fn transform(&self, path: &Path) -> Result<UnitEntry, BuildError> {
        let source = SourceFile::read(path, self.resolve_extensions)?;
        let chain = self.registry.resolve(&source.extension)?.to_vec();
        let file_key = path.display().to_string();

        let cached = self
            .cache
            .and_then(|c| c.get(&file_key, &source.content, self.mode, &chain));
        let record = match cached {
            Some(record) => {
                debug!(file = %file_key, "transform cache hit");
                record
            }
            None => {
                debug!(file = %file_key, chain = ?chain, "transforming");
                let record = execute_chain(&source, &chain, self.stages, self.mode)?;
                if let Some(cache) = self.cache {
                    cache.set(&file_key, &source.content, self.mode, &chain, &record);
                }
                record
            }
        };

        Ok(UnitEntry {
            record,
            references: source.references,
            source_path: source.path,
            source_content: source.content,
        })
    }
}

/// One inline source map for the finalized bundle, carrying every
/// unit's original text. Debuggers honor a single trailing map comment
/// per script, so the map is emitted here rather than per unit.
/// Mappings are intentionally empty: the host's debugger only needs the
/// source panel, not position-level fidelity.
fn bundle_source_map(bundle: &str, units: &[&UnitEntry]) -> String {
    let map = serde_json::json!({
        "version": 3,
        "file": format!("{}.js", bundle),
        "sources": units
            .iter()
            .map(|u| u.source_path.display().to_string())
            .collect::<Vec<_>>(),
        "sourcesContent": units
            .iter()
            .map(|u| u.source_content.as_str())
            .collect::<Vec<_>>(),
        "names": [],
        "mappings": "",
    });
    format!(
        "\n//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}\n",
        STANDARD.encode(map.to_string())
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT DIRECTORY EFFECTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Remove everything inside the output directory, keeping the
/// directory itself (creating it when missing). Idempotent;
/// guarantees no stale outputs from a previous build survive.
pub fn clean_output_dir(out_dir: &Path) -> Result<(), BuildError> {
    if !out_dir.exists() {
        return fs::create_dir_all(out_dir).map_err(|source| BuildError::OutputWrite {
            path: out_dir.to_path_buf(),
            source,
        });
    }

    for entry in WalkDir::new(out_dir).min_depth(1).contents_first(true) {
        let entry = entry.map_err(|e| BuildError::OutputWrite {
            path: out_dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();
        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        removed.map_err(|source| BuildError::Cleanup {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Write every bundle's files. Bundles are independent, so they write
/// in parallel; any failure fails the whole build.
pub fn write_bundles(
    out_dir: &Path,
    bundles: &[EntryBundle],
) -> Result<Vec<WrittenBundle>, BuildError> {
    bundles
        .par_iter()
        .map(|bundle| {
            let mut files = Vec::new();

            let code_path = out_dir.join(format!("{}.js", bundle.name));
            fs::write(&code_path, &bundle.code).map_err(|source| BuildError::OutputWrite {
                path: code_path.clone(),
                source,
            })?;
            files.push(code_path);

            if let Some(css) = &bundle.stylesheet {
                let css_path = out_dir.join(format!("{}.css", bundle.name));
                fs::write(&css_path, css).map_err(|source| BuildError::OutputWrite {
                    path: css_path.clone(),
                    source,
                })?;
                files.push(css_path);
            }

            debug!(bundle = %bundle.name, files = files.len(), "bundle written");
            Ok(WrittenBundle {
                name: bundle.name.clone(),
                files,
            })
        })
        .collect()
}
