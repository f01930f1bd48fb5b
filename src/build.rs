//! Build orchestration.
//!
//! One build = one synchronous pipeline with three explicit barriers:
//! every bundle assembles before any write, every write lands before
//! the inliner runs, and the inliner finishes before the manifest is
//! written. Finishing passes are plain function calls here, not
//! registered callbacks, so ordering is never ambiguous.

use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::cache::IncrementalCache;
use crate::config::{BuildConfig, FALLBACK_TEMPLATE};
use crate::error::BuildError;
use crate::executor::execute_chain;
use crate::graph::{clean_output_dir, write_bundles, EntryBundle, GraphBuilder};
use crate::inliner::inline_bundles;
use crate::manifest::{finalize_manifest, load_static_manifest, write_manifest};
use crate::mode::BuildMode;
use crate::resolver::ChainRegistry;
use crate::source::SourceFile;
use crate::stage::StageRegistry;

pub struct BuildOptions {
    pub mode: BuildMode,
    pub project_dir: PathBuf,
    pub config: BuildConfig,
    /// Incremental transform cache under `.plugin-bundler/cache`.
    pub use_cache: bool,
}

impl BuildOptions {
    pub fn new(project_dir: PathBuf, mode: BuildMode, config: BuildConfig) -> Self {
        BuildOptions {
            mode,
            project_dir,
            config,
            use_cache: true,
        }
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub out_dir: PathBuf,
    /// Files present in the output directory after finalization,
    /// relative to it, sorted.
    pub files: Vec<String>,
}

pub fn run_build(opts: &BuildOptions) -> Result<BuildReport, BuildError> {
    let config = &opts.config;
    let project_dir = &opts.project_dir;
    let out_dir = project_dir.join(&config.out_dir);

    let registry = ChainRegistry::from_rules(&config.rules)?;
    let stages = StageRegistry::builtin();
    stages.validate_rules(&config.rules)?;

    // Entry extensions are checked before any file work.
    for files in config.entries.values() {
        for file in files {
            registry.resolve(&extension_of(Path::new(file)))?;
        }
    }
    if let Some(template) = &config.html_root.template {
        registry.resolve(&extension_of(Path::new(template)))?;
    }

    let cache = opts
        .use_cache
        .then(|| IncrementalCache::new(project_dir.join(".plugin-bundler/cache")));

    info!(mode = %opts.mode, out_dir = %out_dir.display(), "build started");
    clean_output_dir(&out_dir)?;

    // ── barrier (a): every bundle fully assembles before any write ──
    let mut builder = GraphBuilder::new(
        &registry,
        &stages,
        opts.mode,
        cache.as_ref(),
        &config.resolve_extensions,
    );
    let mut bundles: Vec<EntryBundle> = Vec::new();
    for (name, files) in &config.entries {
        let entry_paths: Vec<PathBuf> = files.iter().map(|f| project_dir.join(f)).collect();
        bundles.push(builder.build_bundle(name, &entry_paths)?);
    }

    let html = render_html_root(opts, &registry, &stages)?;
    let html_file = format!("{}.html", config.html_root.name);

    // ── barrier (b): all bundle writes before the inliner ──
    let written = write_bundles(&out_dir, &bundles)?;
    let html_path = out_dir.join(&html_file);
    std::fs::write(&html_path, &html).map_err(|source| BuildError::OutputWrite {
        path: html_path,
        source,
    })?;

    let targets: Vec<_> = written
        .iter()
        .filter(|b| config.html_root.chunks.contains(&b.name))
        .cloned()
        .collect();
    inline_bundles(&out_dir, &html_file, &targets, &config.html_root.inline)?;

    // ── barrier (c): manifest is the last step ──
    let static_manifest = load_static_manifest(&project_dir.join(&config.manifest))?;
    let main_file = format!("{}.js", config.primary_bundle().unwrap_or("main"));
    let manifest = finalize_manifest(&static_manifest, opts.mode, &main_file, &html_file);
    write_manifest(&out_dir, &manifest)?;

    let files = list_output_files(&out_dir)?;
    info!(files = files.len(), "build finished");
    Ok(BuildReport {
        mode: opts.mode,
        out_dir,
        files,
    })
}

/// The HTML root's template goes through the normal transform chain for
/// its extension; without a declared template the compiled-in literal
/// is used.
fn render_html_root(
    opts: &BuildOptions,
    registry: &ChainRegistry,
    stages: &StageRegistry,
) -> Result<String, BuildError> {
    match &opts.config.html_root.template {
        Some(template) => {
            let path = opts.project_dir.join(template);
            let source = SourceFile::read(&path, &opts.config.resolve_extensions)?;
            let chain = registry.resolve(&source.extension)?.to_vec();
            let record = execute_chain(&source, &chain, stages, opts.mode)?;
            Ok(record.code)
        }
        None => Ok(FALLBACK_TEMPLATE.to_string()),
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn list_output_files(out_dir: &Path) -> Result<Vec<String>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(out_dir).min_depth(1) {
        let entry = entry.map_err(|e| BuildError::OutputWrite {
            path: out_dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(out_dir)
                .unwrap_or(entry.path())
                .display()
                .to_string();
            files.push(rel);
        }
    }
    files.sort();
    Ok(files)
}
