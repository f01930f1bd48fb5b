//! Build configuration.
//!
//! Loaded once at process start and never mutated for the lifetime of a
//! build. The compiled-in defaults reproduce the reference plugin
//! project: a `main` bundle from the typed host script, a `bundle`
//! bundle from the UI entry, and a `ui` HTML root that inlines the UI
//! bundle's outputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::BuildError;

/// Literal HTML template used when the HTML root declares no template
/// file of its own.
pub const FALLBACK_TEMPLATE: &str =
    "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"></head><body></body></html>";

/// One extension-pattern → stage-chain registration.
///
/// `test` is either an exact extension (".svelte") or a wildcard
/// pattern (".jsx?", ".s?css"). Stages run in declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRule {
    pub test: String,
    pub stages: Vec<String>,
}

/// The designated HTML-root bundle and its inline targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HtmlRootConfig {
    /// Output name; the emitted file is `<name>.html`.
    pub name: String,
    /// Optional template source file, run through the normal transform
    /// chain for its extension. `None` falls back to
    /// [`FALLBACK_TEMPLATE`].
    pub template: Option<String>,
    /// Pattern selecting which target output files get inlined.
    pub inline: String,
    /// Names of the entry bundles whose outputs are inlined.
    pub chunks: Vec<String>,
}

impl Default for HtmlRootConfig {
    fn default() -> Self {
        HtmlRootConfig {
            name: "ui".to_string(),
            template: None,
            inline: r"\.(js|css)$".to_string(),
            chunks: vec!["bundle".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Bundle name → entry source files, relative to the project dir.
    /// BTreeMap keeps emission order deterministic across builds.
    pub entries: BTreeMap<String, Vec<String>>,
    /// Extension-pattern → stage-chain registrations.
    pub rules: Vec<ChainRule>,
    /// Candidate extensions tried, in order, when a reference omits one.
    pub resolve_extensions: Vec<String>,
    pub html_root: HtmlRootConfig,
    /// Static manifest descriptor, relative to the project dir.
    pub manifest: String,
    /// Output directory, relative to the project dir.
    pub out_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("main".to_string(), vec!["src/code.ts".to_string()]);
        entries.insert("bundle".to_string(), vec!["src/svelte.main.js".to_string()]);

        BuildConfig {
            entries,
            rules: default_rules(),
            resolve_extensions: [".js", ".mjs", ".ts", ".svelte", ".scss", ".html"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            html_root: HtmlRootConfig::default(),
            manifest: "src/manifest.json".to_string(),
            out_dir: "build".to_string(),
        }
    }
}

pub fn default_rules() -> Vec<ChainRule> {
    let rule = |test: &str, stages: &[&str]| ChainRule {
        test: test.to_string(),
        stages: stages.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        rule(".svelte", &["template", "script"]),
        rule(".jsx?", &["script"]),
        rule(".mjs", &["script"]),
        rule(".tsx?", &["typescript", "script"]),
        rule(".s?css", &["style"]),
        rule(".html", &["html"]),
    ]
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let raw = fs::read_to_string(path).map_err(|source| BuildError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| BuildError::Config(format!("{}: {}", path.display(), e)))
    }

    /// The primary code bundle: the first declared entry that is not an
    /// inline target of the HTML root.
    pub fn primary_bundle(&self) -> Option<&str> {
        self.entries
            .keys()
            .find(|name| !self.html_root.chunks.contains(name))
            .or_else(|| self.entries.keys().next())
            .map(String::as_str)
    }
}
