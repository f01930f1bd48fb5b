#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::error::BuildError;
    use crate::executor::execute_chain;
    use crate::mode::BuildMode;
    use crate::source::SourceFile;
    use crate::stage::StageRegistry;

    fn style_source() -> SourceFile {
        SourceFile {
            path: PathBuf::from("src/theme.scss"),
            extension: ".scss".to_string(),
            content: "body { margin: 0; }\n".to_string(),
            references: vec![],
        }
    }

    fn chain(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_production_queues_standalone_stylesheet() {
        let stages = StageRegistry::builtin();
        let record = execute_chain(
            &style_source(),
            &chain(&["style"]),
            &stages,
            BuildMode::Production,
        )
        .unwrap();

        assert_eq!(record.side_artifact.as_deref(), Some("body { margin: 0; }"));
        assert!(record.code.is_empty());
    }

    #[test]
    fn test_development_injects_styles_instead() {
        let stages = StageRegistry::builtin();
        let record = execute_chain(
            &style_source(),
            &chain(&["style"]),
            &stages,
            BuildMode::Development,
        )
        .unwrap();

        assert!(record.side_artifact.is_none());
        assert!(record.code.contains("document.createElement(\"style\")"));
        assert!(record.code.contains("body { margin: 0; }"));
    }

    #[test]
    fn test_units_carry_no_source_map_of_their_own() {
        // The source map belongs to the finalized bundle; a map comment
        // on every concatenated unit would leave all but the last dead.
        let stages = StageRegistry::builtin();
        let source = SourceFile {
            path: PathBuf::from("src/code.js"),
            extension: ".js".to_string(),
            content: "globalThis.__flag = 1;\n".to_string(),
            references: vec![],
        };

        let dev = execute_chain(&source, &chain(&["script"]), &stages, BuildMode::Development)
            .unwrap();
        assert!(!dev.code.contains("sourceMappingURL"));
    }

    #[test]
    fn test_html_units_pass_through() {
        let stages = StageRegistry::builtin();
        let source = SourceFile {
            path: PathBuf::from("src/ui.html"),
            extension: ".html".to_string(),
            content: "<html><body></body></html>".to_string(),
            references: vec![],
        };

        let record = execute_chain(&source, &chain(&["html"]), &stages, BuildMode::Development)
            .unwrap();
        assert_eq!(record.code, source.content);
    }

    #[test]
    fn test_stage_failure_names_stage_and_file() {
        let stages = StageRegistry::builtin();
        let source = SourceFile {
            path: PathBuf::from("src/bad.ts"),
            extension: ".ts".to_string(),
            content: "const = ;".to_string(),
            references: vec![],
        };

        let err = execute_chain(
            &source,
            &chain(&["typescript", "script"]),
            &stages,
            BuildMode::Production,
        )
        .unwrap_err();

        match err {
            BuildError::Stage { stage, file, .. } => {
                assert_eq!(stage, "typescript");
                assert_eq!(file, PathBuf::from("src/bad.ts"));
            }
            other => panic!("expected Stage error, got {}", other),
        }
    }
}
