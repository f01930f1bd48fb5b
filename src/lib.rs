//! # Plugin Bundler
//!
//! Build-pipeline orchestrator: compiles a multi-language plugin
//! project (single-file templates, typed scripts, styles) into a small
//! number of self-contained artifacts for a host that cannot fetch
//! assets at runtime.
//!
//! ## Pipeline Invariants
//!
//! 1. **Frozen configuration**: extension→chain registrations load once
//!    at build start and are never mutated for the lifetime of a build.
//! 2. **Pure transform core**: resolver and executor perform no I/O;
//!    all filesystem effects live in the graph writer, inliner, and
//!    manifest finalizer.
//! 3. **Visit-once traversal**: each source file transforms exactly
//!    once per build, however many files reference it; a back-edge to
//!    an in-progress file is a reference cycle and fails the build.
//! 4. **Barrier ordering**: all bundles assemble before any write, all
//!    writes land before inlining, inlining completes before the
//!    manifest is written.
//! 5. **Fail-fast**: every error is fatal to the whole build; a failed
//!    build's output directory is stale, never partially valid.

mod build;
mod cache;
mod config;
mod error;
mod executor;
mod graph;
mod inliner;
mod manifest;
mod mode;
mod resolver;
mod source;
mod stage;

pub use build::{run_build, BuildOptions, BuildReport};
pub use cache::IncrementalCache;
pub use config::{default_rules, BuildConfig, ChainRule, HtmlRootConfig, FALLBACK_TEMPLATE};
pub use error::BuildError;
pub use executor::{execute_chain, TransformRecord};
pub use graph::{clean_output_dir, write_bundles, EntryBundle, GraphBuilder, WrittenBundle};
pub use inliner::inline_bundles;
pub use manifest::{
    finalize_manifest, load_static_manifest, write_manifest, MANIFEST_FILE, NAME_FALLBACK,
};
pub use mode::BuildMode;
pub use resolver::ChainRegistry;
pub use source::SourceFile;
pub use stage::{Stage, StageContext, StageOutput, StageRegistry};

#[cfg(test)]
mod executor_tests;
#[cfg(test)]
mod manifest_tests;
#[cfg(test)]
mod resolver_tests;
