use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(kind: &str, name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(kind).join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("structviz-cli"));
    cmd.current_dir(repo_root()).env_remove("STRUCTVIZ_LOG");
    cmd
}

#[test]
fn detect_prints_the_document_kind() {
    for (kind, name) in [("tree", "three_nodes.json"), ("diagram", "two_cells.json")] {
        let out = cli()
            .args(["detect", fixture(kind, name).to_string_lossy().as_ref()])
            .output()
            .expect("run cli");
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), format!("{kind}\n"));
    }
}

#[test]
fn render_is_the_default_command() {
    let out = cli()
        .args(["--id", "t1", fixture("tree", "three_nodes.json").to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert!(out.status.success());
    let svg = String::from_utf8(out.stdout).expect("utf8 svg");
    assert!(svg.starts_with(
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="t1" width="240" height="200""#
    ));
    assert_eq!(svg.matches("<circle").count(), 3);
    assert!(svg.ends_with("</svg>\n"));
}

#[test]
fn render_reads_stdin_and_writes_out_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("cells.svg");
    let input = fs::read_to_string(fixture("diagram", "two_cells.json")).expect("read fixture");

    cli()
        .args(["render", "--out", out.to_string_lossy().as_ref(), "-"])
        .write_stdin(input)
        .assert()
        .success();

    let svg = fs::read_to_string(&out).expect("read svg");
    assert!(svg.contains(r#"width="120" height="200""#));
    assert_eq!(svg.matches("<rect").count(), 2);
    assert_eq!(svg.matches("<path").count(), 2);
}

#[test]
fn layout_prints_json_with_config_overrides() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    fs::write(&config, r#"{ "tree": { "nodeRadius": 30 } }"#).expect("write config");

    let out = cli()
        .args([
            "layout",
            "--pretty",
            "--config",
            config.to_string_lossy().as_ref(),
            fixture("tree", "three_nodes.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("layout json");
    assert_eq!(value["kind"], "tree");
    assert_eq!(value["radius"], 30.0);
    assert_eq!(value["width"], 360.0);
    assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
}

#[test]
fn usage_errors_exit_with_two() {
    let out = cli().args(["--bogus"]).output().expect("run cli");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("USAGE:"));
}

#[test]
fn invalid_documents_exit_with_one() {
    let out = cli()
        .arg("-")
        .write_stdin(r#"{ "elements": [ { "type": "Blob" } ] }"#)
        .output()
        .expect("run cli");
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
}
