use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn codebook(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codebook").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("CURRENT_MODEL_CONTEXT_LENGTH")
        .env_remove("RUST_LOG");
    cmd
}

fn write_project(root: &Path) {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/app.py"),
        "class App:\n    def run(self):\n        return 42\n",
    )
    .unwrap();
    fs::write(root.join("src/util.rs"), "pub fn double(x: u32) -> u32 {\n    x * 2\n}\n").unwrap();
    fs::write(root.join("NOTES.txt"), "plain notes\n").unwrap();
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn chunk_outputs_every_file() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "chunk",
        "src/app.py",
        "src/util.rs",
        "NOTES.txt",
    ]));
    let chunks = value.as_array().unwrap();
    assert_eq!(chunks.len(), 1);

    let mut files: Vec<&str> = chunks[0]["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    files.sort_unstable();
    assert_eq!(files, vec!["NOTES.txt", "src/app.py", "src/util.rs"]);
    assert!(chunks[0]["content"]
        .as_str()
        .unwrap()
        .contains("# FILE: src/app.py"));
}

#[test]
fn chunk_text_reports_stats() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    codebook(temp.path())
        .args(["chunk", "src/app.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 chunks"))
        .stdout(predicate::str::contains("src/app.py"));
}

#[test]
fn chunk_text_lists_oversized_records() {
    let temp = tempdir().unwrap();
    let body = "    total = total + 1\n".repeat(40);
    fs::write(
        temp.path().join("big.py"),
        format!("def big():\n    total = 0\n{body}    return total\n"),
    )
    .unwrap();

    codebook(temp.path())
        .args(["--context-length", "250", "chunk", "big.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oversized chunk(s)"))
        .stdout(predicate::str::contains("oversized: "))
        .stdout(predicate::str::contains("> function_definition:big[1-43]"));
}

#[test]
fn estimate_uses_context_length_flag() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "--context-length",
        "16000",
        "estimate",
        "src/app.py",
    ]));
    assert_eq!(value["model_context_length"], 16000);
    assert_eq!(value["max_input_tokens"], 12800);
    assert_eq!(value["estimated_chunks"], 1);
    assert_eq!(value["files"], 1);
}

#[test]
fn config_file_sets_context_length() {
    let temp = tempdir().unwrap();
    write_project(temp.path());
    fs::write(
        temp.path().join("codebook.toml"),
        "context_length = 4000\n\n[chunker]\noverlap_ratio = 0.1\n",
    )
    .unwrap();

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "--config",
        "codebook.toml",
        "estimate",
        "src/util.rs",
    ]));
    assert_eq!(value["model_context_length"], 4000);
}

#[test]
fn env_context_length_is_read() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    let value = json_stdout(
        codebook(temp.path())
            .env("CURRENT_MODEL_CONTEXT_LENGTH", "128000")
            .args(["--format", "json", "estimate", "src/util.rs"]),
    );
    assert_eq!(value["max_input_tokens"], 102400);
    assert_eq!(value["estimated_response_tokens"], 25600);
}

#[test]
fn prompts_require_placeholder() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    codebook(temp.path())
        .args(["prompts", "--template-text", "no slot here", "src/app.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn prompts_wrap_chunks() {
    let temp = tempdir().unwrap();
    write_project(temp.path());
    fs::write(temp.path().join("template.txt"), "Review this code:\n{code}\n").unwrap();

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "prompts",
        "--template",
        "template.txt",
        "src/app.py",
    ]));
    let prompts = value.as_array().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = prompts[0]["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("Review this code:\n"));
    assert!(prompt.contains("def run(self):"));
    assert_eq!(prompts[0]["estimated_response_tokens"], 1639);
}

#[cfg(unix)]
#[test]
fn run_submits_prompts_to_generator() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "run",
        "--template-text",
        "Q: {code}",
        "--generator",
        "wc -c",
        "src/util.rs",
    ]));
    let results = value.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[0]["retries"], 0);
    assert!(results[0]["response"].as_str().unwrap().trim().parse::<u64>().is_ok());
}

#[cfg(unix)]
#[test]
fn run_records_generator_failures() {
    let temp = tempdir().unwrap();
    write_project(temp.path());

    let value = json_stdout(codebook(temp.path()).args([
        "--format",
        "json",
        "run",
        "--template-text",
        "{code}",
        "--generator",
        "cat >/dev/null; echo 'quota exceeded' >&2; exit 1",
        "src/util.rs",
    ]));
    let result = &value.as_array().unwrap()[0];
    assert_eq!(result["status"], "error");
    assert_eq!(result["retries"], 0);
    assert!(result["error"].as_str().unwrap().contains("quota exceeded"));
}

#[test]
fn missing_file_fails() {
    let temp = tempdir().unwrap();
    codebook(temp.path())
        .args(["chunk", "does-not-exist.rs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.rs"));
}
