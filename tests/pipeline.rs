//! End-to-end pipeline properties, run against a throwaway project
//! directory.

use std::fs;
use std::path::Path;

use plugin_bundler::{
    run_build, BuildConfig, BuildError, BuildMode, BuildOptions, ChainRegistry, GraphBuilder,
    StageRegistry,
};

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A minimal plugin project matching the default configuration: a
/// typed host entry (`main`), a UI entry (`bundle`) that pulls in a
/// single-file component and a stylesheet, and a static manifest.
fn plugin_project(dir: &Path) {
    write(
        &dir.join("src/code.ts"),
        "const greeting: string = \"hi\";\nglobalThis.__code = greeting;\n",
    );
    write(
        &dir.join("src/svelte.main.js"),
        "import './App.svelte';\nglobalThis.__boot = 1;\n",
    );
    write(
        &dir.join("src/App.svelte"),
        "<script>\nimport './theme.scss';\nlet label = \"Hello\";\n</script>\n<style>.app { color: red; }</style>\n<div class=\"app\">Hello</div>\n",
    );
    write(&dir.join("src/theme.scss"), "// base\nbody { margin: 0; }\n");
    write(
        &dir.join("src/manifest.json"),
        r#"{"name":"Foo","api":"1.0.0","main":"stale.js"}"#,
    );
}

fn options(dir: &Path, mode: BuildMode) -> BuildOptions {
    BuildOptions::new(dir.to_path_buf(), mode, BuildConfig::default())
}

#[test]
fn production_build_produces_three_self_contained_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    plugin_project(dir.path());

    let report = run_build(&options(dir.path(), BuildMode::Production)).unwrap();
    assert_eq!(report.files, vec!["main.js", "manifest.json", "ui.html"]);

    let ui = fs::read_to_string(report.out_dir.join("ui.html")).unwrap();
    assert!(ui.contains("__boot"), "UI bundle code must be inlined");
    assert!(ui.contains("Hello"), "component markup must be inlined");
    assert!(ui.contains("margin: 0"), "stylesheet must be inlined");
    assert!(ui.contains(".app { color: red; }"));
    assert!(!ui.contains("src=\"bundle.js\""));

    let main = fs::read_to_string(report.out_dir.join("main.js")).unwrap();
    assert!(main.contains("__code"));
    assert!(!main.contains("sourceMappingURL"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report.out_dir.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["main"], "main.js");
    assert_eq!(manifest["ui"], "ui.html");
    assert_eq!(manifest["name"], "🚀 PROD — Foo");
    assert_eq!(manifest["api"], "1.0.0");
}

#[test]
fn development_build_injects_styles_and_emits_source_maps() {
    let dir = tempfile::tempdir().unwrap();
    plugin_project(dir.path());

    let report = run_build(&options(dir.path(), BuildMode::Development)).unwrap();
    assert_eq!(report.files, vec!["main.js", "manifest.json", "ui.html"]);

    let ui = fs::read_to_string(report.out_dir.join("ui.html")).unwrap();
    assert!(ui.contains("document.createElement(\"style\")"));
    assert!(ui.contains("margin: 0"));
    assert!(!report.out_dir.join("bundle.css").exists());
    // One map for the whole bundle, however many units it concatenates.
    assert_eq!(ui.matches("sourceMappingURL").count(), 1);

    let main = fs::read_to_string(report.out_dir.join("main.js")).unwrap();
    assert!(main.contains("sourceMappingURL=data:application/json"));
    assert_eq!(main.matches("sourceMappingURL").count(), 1);

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report.out_dir.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["name"], "⚙️ DEV — Foo");
}

#[test]
fn stylesheet_extraction_follows_mode() {
    let dir = tempfile::tempdir().unwrap();
    plugin_project(dir.path());

    let config = BuildConfig::default();
    let registry = ChainRegistry::from_rules(&config.rules).unwrap();
    let stages = StageRegistry::builtin();
    let entries = vec![dir.path().join("src/svelte.main.js")];

    let mut dev = GraphBuilder::new(
        &registry,
        &stages,
        BuildMode::Development,
        None,
        &config.resolve_extensions,
    );
    assert!(dev.build_bundle("bundle", &entries).unwrap().stylesheet.is_none());

    let mut prod = GraphBuilder::new(
        &registry,
        &stages,
        BuildMode::Production,
        None,
        &config.resolve_extensions,
    );
    assert!(prod.build_bundle("bundle", &entries).unwrap().stylesheet.is_some());
}

#[test]
fn shared_references_transform_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("src/a.js"),
        "import './shared.js';\nglobalThis.__a = 1;\n",
    );
    write(
        &dir.path().join("src/b.js"),
        "import './shared.js';\nglobalThis.__b = 1;\n",
    );
    write(&dir.path().join("src/shared.js"), "globalThis.__shared = 1;\n");

    let config = BuildConfig::default();
    let registry = ChainRegistry::from_rules(&config.rules).unwrap();
    let stages = StageRegistry::builtin();
    let entries = vec![dir.path().join("src/a.js"), dir.path().join("src/b.js")];

    let mut builder = GraphBuilder::new(
        &registry,
        &stages,
        BuildMode::Production,
        None,
        &config.resolve_extensions,
    );
    let bundle = builder.build_bundle("main", &entries).unwrap();

    assert_eq!(builder.unit_count(), 3);
    assert_eq!(bundle.code.matches("__shared").count(), 1);
    assert!(bundle.code.contains("__a"));
    assert!(bundle.code.contains("__b"));
}

#[test]
fn reference_cycles_fail_the_build_with_no_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/a.js"), "import './b.js';\n");
    write(&dir.path().join("src/b.js"), "import './a.js';\n");

    let mut config = BuildConfig::default();
    config.entries.clear();
    config
        .entries
        .insert("main".to_string(), vec!["src/a.js".to_string()]);

    let opts = BuildOptions::new(dir.path().to_path_buf(), BuildMode::Production, config);
    let err = run_build(&opts).unwrap_err();
    assert!(matches!(err, BuildError::CyclicReference { .. }));

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("build")).unwrap().collect();
    assert!(leftovers.is_empty(), "cycle must not produce output files");
}

#[test]
fn stage_failure_invalidates_the_whole_build() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("src/app.js"), "globalThis.__app = 1;\n");
    write(&dir.path().join("src/bad.ts"), "const = ;\n");

    let mut config = BuildConfig::default();
    config.entries.clear();
    // "app" assembles before "broken" fails; its files must still
    // never reach the output directory.
    config
        .entries
        .insert("app".to_string(), vec!["src/app.js".to_string()]);
    config
        .entries
        .insert("broken".to_string(), vec!["src/bad.ts".to_string()]);

    let opts = BuildOptions::new(dir.path().to_path_buf(), BuildMode::Production, config);
    let err = run_build(&opts).unwrap_err();
    match err {
        BuildError::Stage { stage, .. } => assert_eq!(stage, "typescript"),
        other => panic!("expected Stage error, got {}", other),
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("build")).unwrap().collect();
    assert!(leftovers.is_empty());
}

#[test]
fn repeated_builds_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    plugin_project(dir.path());

    let opts = options(dir.path(), BuildMode::Production);
    let first = run_build(&opts).unwrap();
    let manifest_a = fs::read(first.out_dir.join("manifest.json")).unwrap();
    let main_a = fs::read(first.out_dir.join("main.js")).unwrap();
    let ui_a = fs::read(first.out_dir.join("ui.html")).unwrap();

    // Second run goes through the incremental cache.
    let second = run_build(&opts).unwrap();
    assert_eq!(manifest_a, fs::read(second.out_dir.join("manifest.json")).unwrap());
    assert_eq!(main_a, fs::read(second.out_dir.join("main.js")).unwrap());
    assert_eq!(ui_a, fs::read(second.out_dir.join("ui.html")).unwrap());
}

#[test]
fn unknown_entry_extension_aborts_before_any_file_work() {
    let dir = tempfile::tempdir().unwrap();

    let mut config = BuildConfig::default();
    config.entries.clear();
    config
        .entries
        .insert("main".to_string(), vec!["src/logo.png".to_string()]);

    // The entry file deliberately does not exist: the extension check
    // must fire before any read.
    let opts = BuildOptions::new(dir.path().to_path_buf(), BuildMode::Production, config);
    let err = run_build(&opts).unwrap_err();
    assert!(matches!(err, BuildError::UnsupportedExtension(ext) if ext == ".png"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("bundler.config.json"),
        r#"{"entries":{"main":["src/app.js"]},"outDir":"dist"}"#,
    );

    let config = BuildConfig::load(&dir.path().join("bundler.config.json")).unwrap();
    assert_eq!(config.out_dir, "dist");
    assert_eq!(config.entries["main"], vec!["src/app.js".to_string()]);
    // Unspecified sections fall back to the defaults.
    assert_eq!(config.html_root.name, "ui");
    assert!(!config.rules.is_empty());
}
