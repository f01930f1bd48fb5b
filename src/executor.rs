//! Chain executor.
//!
//! Runs a source file through its resolved chain, stage by stage,
//! piping one stage's code into the next. Side artifacts accumulate
//! without being piped. The executor owns the mode-dependent
//! side-channel policy: production queues extracted stylesheet text for
//! a standalone per-bundle file, development rewrites it into
//! runtime-injection code. No I/O happens here.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::mode::BuildMode;
use crate::source::SourceFile;
use crate::stage::{StageContext, StageRegistry};

/// Pure transform result for one source file. This is also the
/// incremental-cache payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRecord {
    pub code: String,
    pub side_artifact: Option<String>,
}

pub fn execute_chain(
    source: &SourceFile,
    chain: &[String],
    stages: &StageRegistry,
    mode: BuildMode,
) -> Result<TransformRecord, BuildError> {
    let ctx = StageContext {
        mode,
        file: source.path.display().to_string(),
    };

    let mut code = source.content.clone();
    let mut side_artifact: Option<String> = None;

    for name in chain {
        let stage = stages
            .get(name)
            .ok_or_else(|| BuildError::Config(format!("unknown stage `{}`", name)))?;
        let out = stage
            .apply(&code, &ctx)
            .map_err(|cause| BuildError::Stage {
                stage: name.clone(),
                file: source.path.clone(),
                cause,
            })?;
        code = out.code;
        if let Some(extracted) = out.side_artifact {
            side_artifact = Some(match side_artifact.take() {
                Some(prev) => format!("{}\n{}", prev, extracted),
                None => extracted,
            });
        }
    }

    // Development trades the zero-file-count optimization for faster
    // iteration: styles are injected at runtime instead of extracted.
    if !mode.extract_styles() {
        if let Some(css) = side_artifact.take() {
            code.push_str(&style_injection_snippet(&css)?);
        }
    }

    Ok(TransformRecord {
        code,
        side_artifact,
    })
}

fn style_injection_snippet(css: &str) -> Result<String, BuildError> {
    let literal = serde_json::to_string(css)
        .map_err(|e| BuildError::Config(format!("style literal: {}", e)))?;
    Ok(format!(
        "(function () {{\n\
         if (typeof document === \"undefined\") return;\n\
         var __style = document.createElement(\"style\");\n\
         __style.textContent = {};\n\
         document.head.appendChild(__style);\n\
         }})();\n",
        literal
    ))
}
