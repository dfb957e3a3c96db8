//! CLI integration tests for repometa.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.args(["--data-dir", &self.data_dir_str()]);
        cmd
    }

    /// A command without `--data-dir`, for exercising config resolution.
    fn bare_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("repometa").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env_remove("REPOMETA_PASSWORD")
            .env_remove("REPOMETA_CONFIG")
            .env_remove("REPOMETA_DATA_DIR")
            .current_dir(self.data_dir());
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd().arg("init").assert()
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).output().expect("failed to run command");
        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }

    fn write_analysis(&self, name: &str, analysis: &Value) -> String {
        let file = self.temp_dir.child(name);
        file.write_str(&analysis.to_string()).expect("write analysis");
        file.path().to_string_lossy().to_string()
    }
}

const REPO: [&str; 6] = ["--owner", "a", "--repo", "b", "--branch", "main"];

fn with_repo<'a>(args: &[&'a str]) -> Vec<&'a str> {
    let mut all = args.to_vec();
    all.extend_from_slice(&REPO);
    all
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();
    ctx.init()
        .success()
        .stdout(predicate::str::contains("\"Success\""));
    assert!(ctx.data_dir().join("repometa.db").exists());
}

#[test]
fn test_config_file_and_data_dir_override() {
    let ctx = TestContext::new();
    let configured = ctx.temp_dir.child("configured");
    let config = ctx.temp_dir.child("repometa.toml");
    config
        .write_str(&format!(
            "data_dir = '{}'\ndatabase = 'custom.db'\n",
            configured.path().display()
        ))
        .expect("write config");
    let config_path = config.path().to_string_lossy().to_string();

    ctx.bare_cmd()
        .args(["--config", config_path.as_str(), "init"])
        .assert()
        .success();
    configured.child("custom.db").assert(predicate::path::exists());

    let flag_dir = ctx.temp_dir.child("flag");
    ctx.bare_cmd()
        .args(["--config", config_path.as_str(), "--data-dir"])
        .arg(flag_dir.path())
        .arg("init")
        .assert()
        .success();
    flag_dir.child("custom.db").assert(predicate::path::exists());

    let env_dir = ctx.temp_dir.child("env");
    ctx.bare_cmd()
        .env("REPOMETA_CONFIG", config.path())
        .env("REPOMETA_DATA_DIR", env_dir.path())
        .arg("init")
        .assert()
        .success();
    env_dir.child("custom.db").assert(predicate::path::exists());
    assert!(!ctx.data_dir().join("data").exists());
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();
    ctx.cmd()
        .args(with_repo(&["repo", "show"]))
        .assert()
        .failure()
        .stderr(predicate::str::contains("repometa init"));
}

#[test]
fn test_repo_add_twice() {
    let ctx = TestContext::new();
    ctx.init().success();

    let added = ctx.json(&with_repo(&["repo", "add"]));
    assert_eq!(added["status"], "Success");
    assert_eq!(added["reason"], "repo for a - b - main has been written");
    assert!(added["repo_id"].is_string());

    ctx.cmd()
        .args(with_repo(&["repo", "add"]))
        .assert()
        .failure()
        .stdout(predicate::str::contains("repo for a - b - main already exists"));
}

#[test]
fn test_file_score_and_reanalysis() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd().args(with_repo(&["repo", "add"])).assert().success();

    let v1 = ctx.write_analysis(
        "v1.json",
        &json!({
            "path": "x.py",
            "last_commit": "c1",
            "commits": 1,
            "line_history": {},
            "functions": [{"name": "f", "signature": "def f()"}]
        }),
    );
    let written = ctx.json(&with_repo(&["file", "write", "--input", v1.as_str()]));
    assert_eq!(written["status"], "Success");
    assert_eq!(written["reason"], "x.py has been inserted");
    assert_eq!(written["outcome"], "inserted");

    ctx.cmd()
        .args(with_repo(&[
            "function", "score", "--path", "x.py", "--name", "f", "--value", "5",
        ]))
        .assert()
        .success()
        .stdout(predicate::str::contains("successfully updated f"));

    let v2 = ctx.write_analysis(
        "v2.json",
        &json!({
            "path": "x.py",
            "last_commit": "c2",
            "commits": 2,
            "functions": [{"name": "f", "signature": "def f(x)"}]
        }),
    );
    let written = ctx.json(&with_repo(&["file", "write", "--input", v2.as_str()]));
    assert_eq!(written["reason"], "x.py has been updated");
    assert_eq!(written["outcome"], "updated");
    assert_eq!(written["function_ids"].as_array().expect("function ids").len(), 1);

    let f = ctx.json(&with_repo(&["function", "show", "--path", "x.py", "--name", "f"]));
    assert_eq!(f["user_score"], 5);
    assert_eq!(f["signature"], "def f(x)");

    ctx.cmd()
        .args(with_repo(&["file", "write", "--input", v2.as_str()]))
        .assert()
        .failure()
        .stdout(predicate::str::contains("x.py is up to date"));
}

#[test]
fn test_file_lock_commands() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd().args(with_repo(&["repo", "add"])).assert().success();
    let input = ctx.write_analysis(
        "x.json",
        &json!({"path": "x.py", "last_commit": "c1", "commits": 1}),
    );
    ctx.cmd()
        .args(with_repo(&["file", "write", "--input", input.as_str()]))
        .assert()
        .success();

    let status = ctx.json(&with_repo(&["file", "lock-status", "--path", "x.py"]));
    assert_eq!(status["lock_status"], false);

    ctx.cmd()
        .args(with_repo(&["file", "lock", "--path", "x.py"]))
        .assert()
        .success();
    let status = ctx.json(&with_repo(&["file", "lock-status", "--path", "x.py"]));
    assert_eq!(status["lock_status"], true);

    ctx.cmd()
        .args(with_repo(&["file", "lock", "--path", "missing.py"]))
        .assert()
        .failure()
        .stdout(predicate::str::contains("no such file a - b - main - missing.py exists"));
}

#[test]
fn test_repo_delete_cascades() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd().args(with_repo(&["repo", "add"])).assert().success();
    let input = ctx.write_analysis(
        "x.json",
        &json!({"path": "x.py", "last_commit": "c1", "commits": 1, "functions": [{"name": "f"}]}),
    );
    ctx.cmd()
        .args(with_repo(&["file", "write", "--input", input.as_str()]))
        .assert()
        .success();

    let files = ctx.json(&with_repo(&["repo", "files"]));
    assert_eq!(files.as_array().expect("files array").len(), 1);

    ctx.cmd()
        .args(with_repo(&["repo", "delete"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("a - b - main deleted"));

    ctx.cmd()
        .args(with_repo(&["repo", "files"]))
        .assert()
        .failure()
        .stdout(predicate::str::contains("no such repo for a - b - main exists"));
}

#[test]
fn test_user_login_flow() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.cmd()
        .args([
            "user",
            "add",
            "--user-name",
            "ada",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--email",
            "ada@example.com",
            "--password",
            "engine",
            "--dev-access",
            "a/b",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("has been created"));

    let user = ctx.json(&["user", "show", "--user-name", "ada"]);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["dev_access"], json!(["a/b"]));
    assert!(user.get("salt").is_none());
    assert!(user.get("secured_password").is_none());

    ctx.cmd()
        .args(["user", "login", "--user-name", "ada", "--password", "wrong"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid password for user ada"));

    let session = ctx.json(&["user", "login", "--user-name", "ada", "--password", "engine"]);
    assert!(
        session["cookie"]
            .as_str()
            .expect("cookie string")
            .starts_with("repometa_")
    );

    ctx.cmd()
        .args(["user", "logout", "--user-name", "ada"])
        .assert()
        .success();
    ctx.cmd()
        .args(["user", "logout", "--user-name", "ada"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "There is no cookie associated with user name: ada",
        ));
}

#[test]
fn test_purge_requires_confirmation() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.cmd().args(with_repo(&["repo", "add"])).assert().success();

    ctx.cmd()
        .args(["purge", "repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ctx.cmd()
        .args(["purge", "repo", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":1"));

    ctx.cmd()
        .args(["purge", "repos", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'repos'"));
}
