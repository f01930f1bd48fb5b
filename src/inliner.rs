//! Inliner finishing pass.
//!
//! Rewrites the HTML-root bundle's emitted file so that every inline
//! target's output is embedded literally: `<script src>`/`<link href>`
//! tags referencing a target file are replaced with inline tags
//! carrying the file's bytes, and templates that never referenced the
//! files get the inline tags injected before `</head>` (styles) and
//! `</body>` (scripts). Afterwards the now-redundant standalone files
//! are deleted; a missing file is fine (already cleaned up), an
//! existing-but-undeletable file is fatal.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::BuildError;
use crate::graph::WrittenBundle;

lazy_static! {
    static ref HEAD_CLOSE_RE: Regex = Regex::new(r"(?i)</head>").unwrap();
    static ref BODY_CLOSE_RE: Regex = Regex::new(r"(?i)</body>").unwrap();
}

/// Inline every target bundle's files (those matching `inline_pattern`)
/// into `html_file`, then delete the inlined standalone files.
pub fn inline_bundles(
    out_dir: &Path,
    html_file: &str,
    targets: &[WrittenBundle],
    inline_pattern: &str,
) -> Result<(), BuildError> {
    let pattern = Regex::new(inline_pattern)
        .map_err(|e| BuildError::Config(format!("bad inline pattern `{}`: {}", inline_pattern, e)))?;

    let html_path = out_dir.join(html_file);
    let mut html = fs::read_to_string(&html_path).map_err(|source| BuildError::SourceRead {
        path: html_path.clone(),
        source,
    })?;

    let mut inlined = Vec::new();
    for target in targets {
        for file in &target.files {
            let file_name = match file.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if !pattern.is_match(&file_name) || !file.is_file() {
                continue;
            }

            let content = fs::read_to_string(file).map_err(|source| BuildError::SourceRead {
                path: file.clone(),
                source,
            })?;

            html = match file.extension().and_then(|e| e.to_str()) {
                Some("js") => inline_script(&html, &file_name, &content),
                Some("css") => inline_style(&html, &file_name, &content),
                _ => continue,
            };

            debug!(file = %file_name, "inlined");
            inlined.push(file.clone());
        }
    }

    fs::write(&html_path, &html).map_err(|source| BuildError::OutputWrite {
        path: html_path.clone(),
        source,
    })?;

    for file in inlined {
        remove_standalone(file, |p| fs::remove_file(p))?;
    }

    info!(html = %html_path.display(), "inlining complete");
    Ok(())
}

/// Delete one inlined standalone file. Already gone is an idempotent
/// rerun, not a failure; an existing-but-undeletable file is fatal.
pub(crate) fn remove_standalone<F>(file: PathBuf, remove: F) -> Result<(), BuildError>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    match remove(&file) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(BuildError::Cleanup { path: file, source }),
    }
}

fn inline_script(html: &str, file_name: &str, content: &str) -> String {
    let tag = format!("<script>{}</script>", content);
    let reference = Regex::new(&format!(
        r#"(?i)<script\b[^>]*\bsrc\s*=\s*["']?{}["']?[^>]*>\s*</script>"#,
        regex::escape(file_name)
    ))
    .expect("escaped file name is a valid pattern");

    if reference.is_match(html) {
        reference.replace_all(html, NoExpand(&tag)).into_owned()
    } else {
        inject_before(html, &BODY_CLOSE_RE, &tag)
    }
}

fn inline_style(html: &str, file_name: &str, content: &str) -> String {
    let tag = format!("<style>{}</style>", content);
    let reference = Regex::new(&format!(
        r#"(?i)<link\b[^>]*\bhref\s*=\s*["']?{}["']?[^>]*/?>"#,
        regex::escape(file_name)
    ))
    .expect("escaped file name is a valid pattern");

    if reference.is_match(html) {
        reference.replace_all(html, NoExpand(&tag)).into_owned()
    } else {
        inject_before(html, &HEAD_CLOSE_RE, &tag)
    }
}

fn inject_before(html: &str, closing: &Regex, tag: &str) -> String {
    match closing.find(html) {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..m.start()]);
            out.push_str(tag);
            out.push_str(&html[m.start()..]);
            out
        }
        None => format!("{}{}", html, tag),
    }
}
