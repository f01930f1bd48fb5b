//! Stage contract and built-in stages.
//!
//! A stage is one atomic, pure content transform:
//! `(content, context{mode}) -> {code, side_artifact?}` or a failure.
//! Stages are stateless across invocations; the only context they see
//! is the read-only build mode. Real-world transform algorithms
//! (template compilers, style preprocessors) plug in behind this
//! contract; the built-ins here are deliberately thin.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::{ast::Statement, AstBuilder};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::config::ChainRule;
use crate::error::BuildError;
use crate::mode::BuildMode;

// ═══════════════════════════════════════════════════════════════════════════════
// CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

pub struct StageContext {
    pub mode: BuildMode,
    /// Originating file, for diagnostics only.
    pub file: String,
}

#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub code: String,
    /// Side-channel artifact (extracted stylesheet text). Recorded by
    /// the executor but never piped into the next stage.
    pub side_artifact: Option<String>,
}

pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, content: &str, ctx: &StageContext) -> Result<StageOutput, String>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed vocabulary of stages, keyed by the names chain rules use.
pub struct StageRegistry {
    stages: HashMap<&'static str, Box<dyn Stage>>,
}

impl StageRegistry {
    pub fn builtin() -> Self {
        let all: Vec<Box<dyn Stage>> = vec![
            Box::new(TemplateStage),
            Box::new(TypedScriptStage),
            Box::new(ScriptStage),
            Box::new(StyleStage),
            Box::new(HtmlStage),
        ];
        let mut stages = HashMap::new();
        for stage in all {
            let name = stage.name();
            stages.insert(name, stage);
        }
        StageRegistry { stages }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Stage> {
        self.stages.get(name).map(|b| b.as_ref())
    }

    /// Reject unknown stage names at configuration time, not mid-build.
    pub fn validate_rules(&self, rules: &[ChainRule]) -> Result<(), BuildError> {
        for rule in rules {
            for name in &rule.stages {
                if !self.stages.contains_key(name.as_str()) {
                    return Err(BuildError::Config(format!(
                        "rule `{}` names unknown stage `{}`",
                        rule.test, name
                    )));
                }
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE STAGE
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    static ref STYLE_RE: Regex = Regex::new(r"(?is)<style[^>]*>([\s\S]*?)</style>").unwrap();
    static ref SCRIPT_RE: Regex =
        Regex::new(r"(?is)<script\b([^>]*)>([\s\S]*?)</script>").unwrap();
    static ref IMPORT_LINE_RE: Regex = Regex::new(r"(?m)^\s*import\b[^;\n]*;?[^\S\n]*$").unwrap();
    static ref EXPORT_BRACE_RE: Regex =
        Regex::new(r"(?m)^export\s*\{[^}]*\}\s*;?[^\S\n]*$").unwrap();
    static ref EXPORT_KEYWORD_RE: Regex = Regex::new(r"(?m)^export\s+(?:default\s+)?").unwrap();
    static ref CSS_IMPORT_RE: Regex =
        Regex::new(r#"(?m)^\s*@import\s+["'](\.{1,2}/[^"']+)["']\s*;?[^\S\n]*$"#).unwrap();
    static ref CSS_LINE_COMMENT_RE: Regex = Regex::new(r"(?m)^\s*//.*$").unwrap();
}

/// Compiles a single-file component (markup + `<script>` + `<style>`)
/// into a self-registering script module. Styles split off as the side
/// artifact; imports are hoisted above the module wrapper so a later
/// script stage can elide them.
struct TemplateStage;

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "template"
    }

    fn apply(&self, content: &str, ctx: &StageContext) -> Result<StageOutput, String> {
        if content.trim().is_empty() {
            return Err(format!("{}: template module is empty", ctx.file));
        }

        let styles: Vec<String> = STYLE_RE
            .captures_iter(content)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();

        let mut script = String::new();
        // Scripts with a src attribute stay in the markup untouched;
        // inline scripts are collected and removed.
        let no_scripts = SCRIPT_RE.replace_all(content, |caps: &Captures| {
            let attrs = &caps[1];
            if attrs.contains("src=") {
                caps[0].to_string()
            } else {
                script.push_str(&caps[2]);
                script.push('\n');
                String::new()
            }
        });
        let markup = STYLE_RE.replace_all(&no_scripts, "").trim().to_string();

        let imports: Vec<String> = IMPORT_LINE_RE
            .find_iter(&script)
            .map(|m| m.as_str().trim().to_string())
            .collect();
        let body = IMPORT_LINE_RE.replace_all(&script, "").trim().to_string();

        // JSON string literals are valid JS string literals.
        let markup_literal =
            serde_json::to_string(&markup).map_err(|e| format!("markup literal: {}", e))?;

        let mut code = String::new();
        for import in &imports {
            code.push_str(import);
            code.push('\n');
        }
        code.push_str("(function () {\n");
        if !body.is_empty() {
            code.push_str(&body);
            code.push('\n');
        }
        code.push_str(&format!("var __markup = {};\n", markup_literal));
        code.push_str(
            "if (typeof document !== \"undefined\" && document.body) {\n\
             var __host = document.createElement(\"div\");\n\
             __host.innerHTML = __markup;\n\
             document.body.appendChild(__host);\n\
             }\n",
        );
        code.push_str("})();\n");

        let side_artifact = if styles.is_empty() {
            None
        } else {
            Some(styles.join("\n\n"))
        };

        Ok(StageOutput {
            code,
            side_artifact,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT STAGES
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_errors(errors: &[impl std::fmt::Debug]) -> String {
    errors
        .iter()
        .map(|e| format!("{:?}", e))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Typed-script lowering: parse as TypeScript, drop type-only
/// top-level statements and type-only imports, reprint.
struct TypedScriptStage;

impl Stage for TypedScriptStage {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn apply(&self, content: &str, ctx: &StageContext) -> Result<StageOutput, String> {
        let allocator = Allocator::default();
        let source_type = SourceType::default()
            .with_module(true)
            .with_typescript(true);
        let ret = Parser::new(&allocator, content, source_type).parse();
        if !ret.errors.is_empty() {
            return Err(format!(
                "{}: typescript parse failed: {}",
                ctx.file,
                parse_errors(&ret.errors)
            ));
        }

        let mut program = ret.program;
        let ast = AstBuilder::new(&allocator);
        let mut body = ast.vec();
        let original = std::mem::replace(&mut program.body, ast.vec());
        for stmt in original {
            match &stmt {
                Statement::TSTypeAliasDeclaration(_)
                | Statement::TSInterfaceDeclaration(_)
                | Statement::TSModuleDeclaration(_)
                | Statement::TSImportEqualsDeclaration(_) => continue,
                Statement::ImportDeclaration(import_decl) => {
                    if import_decl.import_kind.is_type() {
                        continue;
                    }
                }
                Statement::ExportNamedDeclaration(export_decl) => {
                    if export_decl.export_kind.is_type() {
                        continue;
                    }
                }
                _ => {}
            }
            body.push(stmt);
        }
        program.body = body;

        let code = Codegen::new().build(&program).code;
        Ok(StageOutput {
            code,
            side_artifact: None,
        })
    }
}

/// Script normalization for bundle concatenation: parse, elide import
/// declarations (local references are concatenated into the same
/// bundle; bare specifiers have no resolution at runtime), reprint,
/// and strip export keywords.
struct ScriptStage;

impl Stage for ScriptStage {
    fn name(&self) -> &'static str {
        "script"
    }

    fn apply(&self, content: &str, ctx: &StageContext) -> Result<StageOutput, String> {
        let allocator = Allocator::default();
        let source_type = SourceType::default()
            .with_module(true)
            .with_typescript(true);
        let ret = Parser::new(&allocator, content, source_type).parse();
        if !ret.errors.is_empty() {
            return Err(format!(
                "{}: script parse failed: {}",
                ctx.file,
                parse_errors(&ret.errors)
            ));
        }

        let mut program = ret.program;
        let ast = AstBuilder::new(&allocator);
        let mut body = ast.vec();
        let original = std::mem::replace(&mut program.body, ast.vec());
        for stmt in original {
            if matches!(stmt, Statement::ImportDeclaration(_)) {
                continue;
            }
            body.push(stmt);
        }
        program.body = body;

        let printed = Codegen::new().build(&program).code;
        let without_reexports = EXPORT_BRACE_RE.replace_all(&printed, "");
        let code = EXPORT_KEYWORD_RE
            .replace_all(&without_reexports, "")
            .to_string();

        Ok(StageOutput {
            code,
            side_artifact: None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE & HTML STAGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Style preprocessing: whole content becomes the side artifact.
/// Relative `@import`s are elided (the referenced sheets are traversed
/// and concatenated into the same bundle stylesheet) and scss-style
/// line comments are stripped.
struct StyleStage;

impl Stage for StyleStage {
    fn name(&self) -> &'static str {
        "style"
    }

    fn apply(&self, content: &str, _ctx: &StageContext) -> Result<StageOutput, String> {
        let without_imports = CSS_IMPORT_RE.replace_all(content, "");
        let css = CSS_LINE_COMMENT_RE
            .replace_all(&without_imports, "")
            .trim()
            .to_string();

        Ok(StageOutput {
            code: String::new(),
            side_artifact: if css.is_empty() { None } else { Some(css) },
        })
    }
}

/// HTML template passthrough. The inliner does its work after emission.
struct HtmlStage;

impl Stage for HtmlStage {
    fn name(&self) -> &'static str {
        "html"
    }

    fn apply(&self, content: &str, _ctx: &StageContext) -> Result<StageOutput, String> {
        Ok(StageOutput {
            code: content.to_string(),
            side_artifact: None,
        })
    }
}
