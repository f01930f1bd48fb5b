//! Transform resolver.
//!
//! Maps a source file's extension to the ordered chain of stages to
//! apply. Chains are registered once, at configuration time, as a
//! mapping from extension pattern to stage list; the registry is frozen
//! after construction and never mutated during a build.
//!
//! Pattern precedence is exact-before-wildcard: a literal pattern like
//! ".svelte" always wins over a wildcard like ".jsx?" regardless of
//! declaration order. Within each class, first match wins.

use regex::Regex;

use crate::config::ChainRule;
use crate::error::BuildError;

pub struct ChainRegistry {
    exact: Vec<(String, Vec<String>)>,
    wildcard: Vec<(Regex, Vec<String>)>,
}

impl ChainRegistry {
    pub fn from_rules(rules: &[ChainRule]) -> Result<Self, BuildError> {
        let mut exact = Vec::new();
        let mut wildcard = Vec::new();

        for rule in rules {
            if rule.stages.is_empty() {
                return Err(BuildError::Config(format!(
                    "rule `{}` declares an empty stage chain",
                    rule.test
                )));
            }
            if is_exact(&rule.test) {
                exact.push((rule.test.clone(), rule.stages.clone()));
            } else {
                // The pattern is regex-like except for its literal dots.
                let anchored = format!("^{}$", rule.test.replace('.', "\\."));
                let re = Regex::new(&anchored).map_err(|e| {
                    BuildError::Config(format!("bad extension pattern `{}`: {}", rule.test, e))
                })?;
                wildcard.push((re, rule.stages.clone()));
            }
        }

        Ok(ChainRegistry { exact, wildcard })
    }

    /// Resolve an extension (leading dot included, e.g. ".ts") to its
    /// stage chain.
    pub fn resolve(&self, extension: &str) -> Result<&[String], BuildError> {
        for (pattern, stages) in &self.exact {
            if pattern == extension {
                return Ok(stages);
            }
        }
        for (re, stages) in &self.wildcard {
            if re.is_match(extension) {
                return Ok(stages);
            }
        }
        Err(BuildError::UnsupportedExtension(extension.to_string()))
    }
}

/// A pattern with no regex metacharacters registers as an exact match.
fn is_exact(pattern: &str) -> bool {
    pattern
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}
