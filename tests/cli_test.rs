use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn docgen(cwd: &Path, authoring: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docgen"))
        .args(args)
        .current_dir(cwd)
        .env("DOCGEN_AUTHORING_ROOT", authoring)
        .env_remove("DOCGEN_MODE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn cargo_workspace(root: &Path) {
    fs::write(
        root.join("Cargo.toml"),
        "[workspace]\nmembers = [\"crates/*\"]\n",
    )
    .unwrap();
    let docs = root.join("crates/engine/docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("docgen.config.yml"),
        r#"
title: Engine
sections:
  - { name: intro, status: production, output: intro.md }
  - { name: internals, status: dev, output: internals.md }
"#,
    )
    .unwrap();
    fs::write(docs.join("intro.md"), "# Intro").unwrap();
    fs::write(docs.join("internals.md"), "# Internals").unwrap();
    fs::create_dir_all(root.join("crates/undocumented")).unwrap();
}

#[test]
fn test_config_command_with_custom_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("custom.toml");
    fs::write(&settings, "[watch]\ndebounce_ms = 750\n").unwrap();

    let output = docgen(
        temp_dir.path(),
        &temp_dir.path().join("authoring"),
        &["--config", settings.to_str().unwrap(), "config"],
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("debounce_ms = 750"));
}

#[test]
fn test_env_overrides_nested_setting() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_docgen"))
        .arg("config")
        .current_dir(temp_dir.path())
        .env("DOCGEN_WEBSITE__BASE_URL", "/handbook")
        .env("DOCGEN_WATCH__DEBOUNCE_MS", "125")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("base_url = \"/handbook\""));
    assert!(text.contains("debounce_ms = 125"));
}

#[test]
fn test_list_shows_visible_sections_per_mode() {
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo).unwrap();
    cargo_workspace(&repo);
    let authoring = temp_dir.path().join("authoring");

    let dev = docgen(&repo, &authoring, &["list", "--mode", "dev"]);
    assert!(dev.status.success());
    let text = stdout(&dev);
    assert!(text.contains("repo/engine"));
    assert!(text.contains("legacy"));
    assert!(text.contains("2/2 sections visible in dev"));
    assert!(!text.contains("undocumented"));

    let prod = docgen(&repo, &authoring, &["list", "--mode", "prod"]);
    assert!(stdout(&prod).contains("1/2 sections visible in prod"));
}

#[test]
fn test_aggregate_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(&repo).unwrap();
    cargo_workspace(&repo);
    let out = temp_dir.path().join("out");

    let output = docgen(
        temp_dir.path(),
        &temp_dir.path().join("authoring"),
        &[
            "--root",
            repo.to_str().unwrap(),
            "aggregate",
            "--output-dir",
            out.to_str().unwrap(),
            "--mode",
            "prod",
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Aggregated 1 packages"));
    assert!(out.join("engine/intro.md").is_file());
    assert!(!out.join("engine/internals.md").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["mode"], "prod");
    assert_eq!(manifest["packages"][0]["title"], "Engine");
    assert_eq!(manifest["packages"][0]["ecosystem"], "repo");
}

#[test]
fn test_aggregate_with_nothing_documented_still_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let repo = temp_dir.path().join("repo");
    fs::create_dir_all(repo.join("packages/bare")).unwrap();
    fs::write(
        repo.join("package.json"),
        r#"{ "name": "repo", "workspaces": ["packages/*"] }"#,
    )
    .unwrap();
    let out = temp_dir.path().join("out");

    let output = docgen(
        &repo,
        &temp_dir.path().join("authoring"),
        &["aggregate", "--output-dir", out.to_str().unwrap(), "--mode", "dev"],
    );

    assert!(output.status.success());
    assert!(out.join("manifest.json").is_file());
}

#[test]
fn test_aggregate_outside_any_ecosystem_fails() {
    let temp_dir = TempDir::new().unwrap();
    let empty = temp_dir.path().join("empty");
    fs::create_dir_all(&empty).unwrap();
    let out = temp_dir.path().join("out");

    let output = docgen(
        temp_dir.path(),
        &temp_dir.path().join("authoring"),
        &[
            "--root",
            empty.to_str().unwrap(),
            "aggregate",
            "--output-dir",
            out.to_str().unwrap(),
            "--mode",
            "prod",
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
    assert!(!out.join("manifest.json").exists());
}

#[test]
fn test_aggregate_requires_mode() {
    let temp_dir = TempDir::new().unwrap();
    let output = docgen(
        temp_dir.path(),
        &temp_dir.path().join("authoring"),
        &["aggregate", "--output-dir", "out"],
    );
    assert!(!output.status.success());
}
