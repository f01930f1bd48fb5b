//! Build mode flag.
//!
//! Read once at build start and threaded into every stage and finishing
//! pass as read-only context. The mode changes three things: inline
//! source-map emission, the stylesheet extraction strategy, and the
//! badge prefixed to the manifest name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }

    /// Badge prefixed to the manifest `name` field.
    pub fn badge(&self) -> &'static str {
        match self {
            BuildMode::Production => "🚀 PROD",
            BuildMode::Development => "⚙️ DEV",
        }
    }

    /// Inline source maps are a development aid only.
    pub fn emit_source_maps(&self) -> bool {
        !self.is_production()
    }

    /// Production writes extracted stylesheet text to a standalone file
    /// per bundle; development rewrites it into runtime-injection code
    /// so iterative rebuilds touch fewer files.
    pub fn extract_styles(&self) -> bool {
        self.is_production()
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Development => write!(f, "development"),
            BuildMode::Production => write!(f, "production"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(BuildMode::Development),
            "production" => Ok(BuildMode::Production),
            other => Err(format!(
                "unknown build mode \"{}\" (expected \"development\" or \"production\")",
                other
            )),
        }
    }
}
