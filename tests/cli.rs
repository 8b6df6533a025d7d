use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const WIDGET: &str = "\
/**
 * Draws things.
 */
class Widget {
  draw(ctx) {
    ctx.fill();
  }
}
";

#[test]
fn cli_stub_respects_jsstubignore_and_hidden() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();

    write_file(&src.path().join("lib/widget.js"), WIDGET);
    write_file(&src.path().join("vendor/jquery.js"), WIDGET);
    write_file(&src.path().join(".config.js"), WIDGET);
    write_file(&src.path().join("notes.txt"), "class NotJs {\n}\n");
    write_file(&src.path().join(".jsstubignore"), "vendor/\n");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args([
            "stub",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
            "--json",
            "--per-file",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let files = v.get("files").and_then(|f| f.as_array()).unwrap();

    let paths: Vec<String> = files
        .iter()
        .map(|f| f.get("path").unwrap().as_str().unwrap().to_string())
        .collect();

    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("widget.js"));
    assert_eq!(v["totals"]["class_functions"], 1);
    assert_eq!(v["written"], 1);

    let stub = fs::read_to_string(out.path().join("lib/widget.js")).unwrap();
    assert_eq!(stub, "/**\n* Draws things.\n*/\nclass Widget {\ndraw(ctx) {}\n}\n");
}

#[test]
fn cli_stub_text_report_and_failures() {
    let src = tempdir().unwrap();

    write_file(&src.path().join("good.js"), WIDGET);
    write_file(&src.path().join("bad.js"), "function broken() {\n  if (x) {\n}\n");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["stub", src.path().to_str().unwrap()])
        .output()
        .unwrap();

    // Per-file failures don't fail the run.
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("bad.js: error: "));
    assert!(stdout.contains("unterminated block starting at line 1"));
    assert!(stdout.contains("End result:"));
    assert!(stdout.contains("  classes:         1"));
    assert!(stdout.contains("  failed:          1"));
}

#[test]
fn cli_file_prints_stub() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("module.js");
    write_file(
        &path,
        "define(['dep'], function(dep) {\n  return class Widget {\n    draw() {}\n  };\n});\n",
    );

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["file", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "class Widget {\ndraw() {}\n}\n");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["file", path.to_str().unwrap(), "--wrap-closure"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "(function(result){\nreturn class Widget {\ndraw() {}\n}\n});\n"
    );
}

#[test]
fn cli_inspect_dumps_declarations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("api.js");
    write_file(&path, "var api = {\n  retries: 3,\n  get(url) {\n    return fetch(url);\n  }\n};\n");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["inspect", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let var = &v["var_declarations"][0];
    assert_eq!(var["header"]["declaration"], "var api = {");
    assert_eq!(var["functions"][0]["header"]["declaration"], "get(url) {");
    assert_eq!(var["properties"][0]["key"], "retries");
    assert_eq!(var["properties"][0]["value"]["kind"], "scalar");
    assert_eq!(var["properties"][0]["value"]["value"], "3");
}

#[test]
fn cli_file_unterminated_block_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.js");
    write_file(&path, "class Broken {\n  run() {}\n");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["file", path.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unterminated block starting at line 1"));
}

#[test]
fn cli_missing_path_exit_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["stub", "/nonexistent/jsstub/tree"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("error: path not found"));
}

#[test]
fn cli_json_error_output_is_valid_json_even_with_quotes_in_path() {
    let dir = tempdir().unwrap();

    let bad_path = dir.path().join("does-not-exist-\"quoted\"");

    let output = Command::new(env!("CARGO_BIN_EXE_jsstub"))
        .args(["stub", bad_path.to_str().unwrap(), "--json"])
        .output()
        .unwrap();

    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    let _: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
}
