//! Build error taxonomy.
//!
//! Every variant is fatal to the whole build: there is no
//! partial-success reporting and no resume contract. A failed build's
//! output directory must be treated as stale by the caller.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no transform chain registered for extension `{0}`")]
    UnsupportedExtension(String),

    #[error("stage `{stage}` failed for {}: {cause}", .file.display())]
    Stage {
        stage: String,
        file: PathBuf,
        cause: String,
    },

    #[error("reference cycle detected: {}", .path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("cannot remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write manifest {}: {source}", .path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
