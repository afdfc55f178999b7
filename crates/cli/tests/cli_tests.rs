use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const GOOD: &str = "---
title: Summarize
difficulty: beginner
audience: [analysts]
platforms: [any]
topics: [summarization]
version: \"1.2\"
date: 2024-03-15
---
# Summarize

## Prompt Template

```
Summarize [DOCUMENT] in [LENGTH] sentences.
```

## Variables

| Variable | Description |
|----------|-------------|
| [DOCUMENT] | text to summarize |
| [LENGTH] | number of sentences |
";

const BAD: &str = "---
difficulty: expert
effectiveness_score: 11
---
## Prompt
Do [DESCRIBE_YOUR_TASK].

## Variables
- TASK: what to do
";

/// Run promptlint in `dir` with a clean environment
fn run_promptlint(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_promptlint"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR")
        .env_remove("PROMPTLINT_WORKSPACE")
        .env_remove("PROMPTLINT_CONFIG")
        .env_remove("PROMPTLINT_SCHEMA")
        .output()
        .expect("Failed to execute promptlint")
}

fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

// =============================================================================
// CHECK COMMAND TESTS
// =============================================================================

#[test]
fn test_check_clean_corpus_passes() {
    let dir = corpus(&[("prompts/summarize.md", GOOD)]);

    let output = run_promptlint(dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr_str(&output));
    let stdout = stdout_str(&output);
    assert!(stdout.contains("prompts/summarize.md: ok"));
    assert!(stdout.contains("Verdict: PASS"));
}

#[test]
fn test_check_reports_every_document_and_fails() {
    let dir = corpus(&[("a.md", GOOD), ("b.md", BAD), ("c.md", GOOD)]);

    let output = run_promptlint(dir.path(), &["check", "--json"]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr_str(&output));
    let report: serde_json::Value = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(report["verdict"], "fail");
    assert_eq!(report["documentsChecked"], 3);

    let documents = report["documents"].as_array().unwrap();
    let ids: Vec<&str> = documents.iter().map(|d| d["document"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["a.md", "b.md", "c.md"]);
    assert!(documents[0]["findings"].as_array().unwrap().is_empty());

    let codes: Vec<&str> = documents[1]["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"invalid-enum-value"));
    assert!(codes.contains(&"out-of-range"));
    assert!(codes.contains(&"undeclared-placeholder"));
    assert!(codes.contains(&"unused-variable"));
    assert_eq!(report["summary"]["out-of-range"], 1);
}

#[test]
fn test_check_output_is_stable() {
    let dir = corpus(&[("x.md", BAD), ("y.md", BAD), ("z.md", GOOD)]);

    let first = run_promptlint(dir.path(), &["check", "--jobs", "1"]);
    let second = run_promptlint(dir.path(), &["check", "--jobs", "4"]);

    assert_eq!(stdout_str(&first), stdout_str(&second));
}

#[test]
fn test_check_missing_path_is_fatal() {
    let dir = corpus(&[("a.md", GOOD)]);

    let output = run_promptlint(dir.path(), &["check", "nope"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_str(&output).contains("does not exist"));
}

#[test]
fn test_broken_schema_is_fatal() {
    let dir = corpus(&[
        ("a.md", GOOD),
        ("schema.yaml", "fields:\n  score:\n    kind: string\n    range: { min: 0, max: 1 }\n"),
    ]);

    let output = run_promptlint(dir.path(), &["--schema", "schema.yaml", "check"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_str(&output).contains("range"));
    assert!(stdout_str(&output).is_empty());
}

#[test]
fn test_config_file_sets_schema() {
    let dir = corpus(&[
        ("a.md", GOOD),
        (
            ".promptlint/config.yaml",
            "schema: strict.yaml\n",
        ),
        (
            "strict.yaml",
            "extends: default\nfields:\n  owner:\n    kind: string\n    required: true\n",
        ),
    ]);

    let output = run_promptlint(dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_str(&output).contains("required field 'owner' is missing"));
}

// =============================================================================
// OTHER COMMANDS
// =============================================================================

#[test]
fn test_schema_command_prints_builtin_fields() {
    let dir = tempdir().unwrap();

    let output = run_promptlint(dir.path(), &["schema", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr_str(&output));
    let schema: serde_json::Value = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(schema["fields"]["difficulty"]["kind"], "string");
    assert_eq!(schema["fields"]["effectivenessScore"]["range"]["max"], 10.0);
}

#[test]
fn test_vars_command() {
    let dir = corpus(&[("bad.md", BAD)]);

    let output = run_promptlint(dir.path(), &["vars", "bad.md", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr_str(&output));
    let vars: serde_json::Value = serde_json::from_str(&stdout_str(&output)).unwrap();
    assert_eq!(vars["placeholders"][0]["name"], "DESCRIBE_YOUR_TASK");
    assert_eq!(vars["variables"][0]["name"], "TASK");
    assert_eq!(vars["findings"].as_array().unwrap().len(), 2);
}

#[test]
fn test_render_command() {
    let dir = corpus(&[("summarize.md", GOOD)]);

    let output = run_promptlint(
        dir.path(),
        &["render", "summarize.md", "--var", "DOCUMENT=the memo", "--var", "LENGTH=three"],
    );

    assert!(output.status.success(), "stderr: {}", stderr_str(&output));
    assert_eq!(stdout_str(&output).trim(), "Summarize the memo in three sentences.");

    let missing = run_promptlint(dir.path(), &["render", "summarize.md", "--var", "DOCUMENT=x"]);
    assert!(!missing.status.success());
    assert!(stderr_str(&missing).contains("LENGTH"));
}
