use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

fn argspec(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argspec"))
        .args(args)
        .output()
        .expect("failed to run argspec")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("failed to write fixture");
    path
}

const LS: &str = "[-l] [--color=<mode>] <dirs...>";

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_prints_canonical_usage_and_nodes() {
    let output = argspec(&["check", "src [dst] -v --out=<file>"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["canonical"], "<src> [<dst>] [-v] [--out=<file>]");
    assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(json["nodes"][3]["kind"], "variable_option");
    assert_eq!(json["nodes"][3]["value_name"], "file");
}

#[test]
fn check_text_format() {
    let output = argspec(&["check", LS, "--format", "text"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("[-l] [--color=<mode>] <dirs...>\n"));
    assert!(text.contains("variadic"));
}

#[test]
fn check_reports_grammar_error_with_caret() {
    let output = argspec(&["check", "<src> [-l] <l>"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.starts_with("error: A flag cannot be assigned to a variable."), "{err}");
    assert!(err.contains("  | <src> [-l] <l>\n"), "{err}");
    assert!(err.contains(&format!("  | {}^", " ".repeat(11))), "{err}");
}

#[test]
fn check_with_custom_specials() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "specials.yaml", "flag_prefix: \"+\"\nassignment: \":\"\n");
    let output = argspec(&[
        "check",
        "[+v] [++out:<file>] <x> ++",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "yaml",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let yaml: serde_yaml::Value = serde_yaml::from_str(&stdout(&output)).unwrap();
    assert_eq!(yaml["canonical"].as_str(), Some("[+v] [++out:<file>] <x> ++"));
    assert_eq!(yaml["specials"]["assignment"].as_str(), Some(":"));
}

#[test]
fn check_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "specials.yaml", "quote: \"[\"\n");
    let output = argspec(&["check", "<x>", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to load config"));
}

// ---------------------------------------------------------------------------
// match
// ---------------------------------------------------------------------------

#[test]
fn match_prints_bound_values() {
    let output = argspec(&["match", LS, "--", "--color=auto", "-l", "src", "docs"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"l": true, "color": "auto", "dirs": ["src", "docs"]})
    );
}

#[test]
fn match_unknown_flag_fails_with_location() {
    let output = argspec(&["match", LS, "--", "--colour=auto"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Unknown flag."), "{err}");
    assert!(err.contains("argument 0, offset 0"), "{err}");
    assert!(err.contains("  | --colour=auto\n  | ^"), "{err}");
}

#[test]
fn match_too_few_arguments() {
    let output = argspec(&["match", "<src> <dst>", "--", "a.txt"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Too few arguments. (argument 1, offset 0)"));
}

#[test]
fn match_text_format() {
    let output = argspec(&["match", "<src> <dst>", "--format", "text", "--", "a", "b"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("src = a\n"));
    assert!(text.contains("dst = b\n"));
}

// ---------------------------------------------------------------------------
// match-file
// ---------------------------------------------------------------------------

#[test]
fn match_file_matches_every_line() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "lines.txt",
        "# directory listings\n-l src\n\n--color=never \"my docs\" src\n",
    );
    let output = argspec(&["match-file", LS, "--input", input.to_str().unwrap(), "--jobs", "2"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let outcomes = json.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["line"], 2);
    assert_eq!(outcomes[0]["matches"]["l"], true);
    assert_eq!(outcomes[1]["line"], 4);
    assert_eq!(outcomes[1]["matches"]["dirs"], serde_json::json!(["my docs", "src"]));
}

#[test]
fn match_file_reports_failed_lines() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "lines.txt", "src\n-x src\n\"unterminated\n");
    let output = argspec(&["match-file", LS, "--input", input.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("2 of 3 lines failed to match"));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(json[0].get("error").is_none());
    assert_eq!(json[1]["error"]["kind"], "unknown_flag");
    assert_eq!(json[2]["error"]["kind"], "open_special_character");
    assert_eq!(json[2]["error"]["phase"], "arguments");
}

#[test]
fn match_file_missing_input() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.txt");
    let output = argspec(&["match-file", LS, "--input", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read"));
}
