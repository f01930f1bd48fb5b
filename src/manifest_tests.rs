#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::io;

    use crate::error::BuildError;
    use crate::manifest::{finalize_manifest, write_manifest, NAME_FALLBACK};
    use crate::mode::BuildMode;

    #[test]
    fn test_computed_keys_override_static_keys() {
        let static_manifest = json!({
            "name": "Foo",
            "main": "stale.js",
            "ui": "stale.html",
        });

        let merged = finalize_manifest(&static_manifest, BuildMode::Production, "main.js", "ui.html");
        assert_eq!(merged["main"], "main.js");
        assert_eq!(merged["ui"], "ui.html");
        assert_eq!(merged["name"], "🚀 PROD — Foo");
    }

    #[test]
    fn test_development_badge() {
        let merged = finalize_manifest(
            &json!({ "name": "Foo" }),
            BuildMode::Development,
            "main.js",
            "ui.html",
        );
        assert_eq!(merged["name"], "⚙️ DEV — Foo");
    }

    #[test]
    fn test_missing_and_empty_name_fall_back() {
        let merged = finalize_manifest(&json!({}), BuildMode::Production, "main.js", "ui.html");
        assert_eq!(merged["name"], format!("🚀 PROD — {}", NAME_FALLBACK));

        // JS-style falsiness: an empty string counts as absent.
        let merged = finalize_manifest(
            &json!({ "name": "" }),
            BuildMode::Production,
            "main.js",
            "ui.html",
        );
        assert_eq!(merged["name"], format!("🚀 PROD — {}", NAME_FALLBACK));
    }

    #[test]
    fn test_id_falls_back_to_empty_string() {
        let merged = finalize_manifest(&json!({}), BuildMode::Production, "main.js", "ui.html");
        assert_eq!(merged["id"], "");

        let merged = finalize_manifest(
            &json!({ "id": "12345" }),
            BuildMode::Production,
            "main.js",
            "ui.html",
        );
        assert_eq!(merged["id"], "12345");
    }

    #[test]
    fn test_unreserved_keys_pass_through() {
        let static_manifest = json!({
            "api": "1.0.0",
            "editorType": ["figma"],
        });

        let merged = finalize_manifest(&static_manifest, BuildMode::Production, "main.js", "ui.html");
        assert_eq!(merged["api"], "1.0.0");
        assert_eq!(merged["editorType"], json!(["figma"]));
    }

    #[test]
    fn test_unwritable_manifest_carries_the_io_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");

        let err = write_manifest(&missing, &json!({})).unwrap_err();
        match err {
            BuildError::ManifestWrite { path, source } => {
                assert!(path.ends_with("manifest.json"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected ManifestWrite error, got {}", other),
        }
    }

    #[test]
    fn test_finalization_is_deterministic() {
        let static_manifest = json!({ "name": "Foo", "api": "1.0.0" });
        let a = finalize_manifest(&static_manifest, BuildMode::Production, "main.js", "ui.html");
        let b = finalize_manifest(&static_manifest, BuildMode::Production, "main.js", "ui.html");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
