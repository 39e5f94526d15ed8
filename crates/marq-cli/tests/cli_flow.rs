use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_marq"))
}

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("config")).expect("create config dir");
        std::fs::create_dir_all(root.path().join("data")).expect("create data dir");
        Self { root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn config_file(&self) -> PathBuf {
        self.path("config").join("marq").join("config.toml")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.arg("--no-input")
            .env("XDG_CONFIG_HOME", self.path("config"))
            .env("XDG_DATA_HOME", self.path("data"))
            .env("NO_COLOR", "1")
            .env_remove("MARQ_PASSWORD")
            .env_remove("MARQ_TAPESTRY")
            .env_remove("MARQ_CONFIG")
            .env_remove("MARQ_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run marq")
    }

    fn run_with_password(&self, password: &str, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .env("MARQ_PASSWORD", password)
            .output()
            .expect("run marq")
    }

    fn init(&self, tapestry: &Path) {
        let output = self.run(&["init", tapestry.to_str().expect("utf8 path")]);
        assert_success(&output, "init");
    }

    fn add(&self, title: &str) {
        let output = self.run(&[
            "add",
            "--intention",
            "awe",
            "--time",
            "dawn",
            "--region",
            "harbor",
            "--title",
            title,
        ]);
        assert_success(&output, "add");
    }

    fn list_json(&self) -> Vec<serde_json::Value> {
        let output = self.run(&["list", "--json"]);
        assert_success(&output, "list");
        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("parse list json");
        value.as_array().expect("list output array").clone()
    }
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{} failed: stdout={}, stderr={}",
        what,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn store_file(tapestry: &Path) -> PathBuf {
    tapestry.join("marq_tapestry_threads.json")
}

#[test]
fn test_cli_init_add_list() {
    let sandbox = Sandbox::new();
    let tapestry = sandbox.path("tapestry");
    sandbox.init(&tapestry);

    let config = std::fs::read_to_string(sandbox.config_file()).expect("read config");
    assert!(config.contains("[tapestry]"));
    assert!(config.contains("backend = \"file\""));
    assert_eq!(
        std::fs::read_to_string(store_file(&tapestry)).expect("read store"),
        "[]"
    );

    sandbox.add("First light");
    sandbox.add("Second tide");

    let threads = sandbox.list_json();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["title"], "First light");
    assert_eq!(threads[0]["previousHash"], "GENESIS_HASH");
    assert_eq!(threads[1]["previousHash"], threads[0]["hash"]);
    assert_eq!(
        threads[0]["id"].as_str().expect("id"),
        &threads[0]["hash"].as_str().expect("hash")[..12]
    );

    let table = sandbox.run(&["list", "--limit", "1"]);
    assert_success(&table, "list table");
    let rendered = String::from_utf8_lossy(&table.stdout);
    assert!(rendered.contains("Second tide"));
    assert!(!rendered.contains("First light"));
}

#[test]
fn test_cli_sqlite_backend() {
    let sandbox = Sandbox::new();
    let tapestry = sandbox.path("tapestry.db");
    sandbox.init(&tapestry);
    assert!(tapestry.is_file());

    let config = std::fs::read_to_string(sandbox.config_file()).expect("read config");
    assert!(config.contains("backend = \"sqlite\""));

    sandbox.add("Stored in sqlite");
    let threads = sandbox.list_json();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["title"], "Stored in sqlite");
}

#[test]
fn test_cli_add_rejects_unsafe_title() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));

    let output = sandbox.run(&[
        "add",
        "--intention",
        "awe",
        "--time",
        "dawn",
        "--region",
        "harbor",
        "--title",
        "<script>",
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(sandbox.list_json().is_empty());
}

#[test]
fn test_cli_export_import_round_trip() {
    let source = Sandbox::new();
    source.init(&source.path("tapestry"));
    source.add("Exported one");
    source.add("Exported two");

    let scroll = source.path("scroll.json");
    let export = source.run(&["export", "--output", scroll.to_str().expect("utf8")]);
    assert_success(&export, "export");

    let target = Sandbox::new();
    target.init(&target.path("tapestry"));
    let import = target.run(&["import", scroll.to_str().expect("utf8")]);
    assert_success(&import, "import");
    assert!(String::from_utf8_lossy(&import.stdout).contains("Imported 2 threads"));

    assert_eq!(target.list_json(), source.list_json());
}

#[test]
fn test_cli_import_rejects_tampered_scroll() {
    let source = Sandbox::new();
    source.init(&source.path("tapestry"));
    source.add("Original title");
    source.add("Next");

    let export = source.run(&["export"]);
    assert_success(&export, "export");
    let tampered = String::from_utf8_lossy(&export.stdout).replace("Original title", "Forged title");
    let scroll = source.path("tampered.json");
    std::fs::write(&scroll, tampered).expect("write scroll");

    let target = Sandbox::new();
    target.init(&target.path("tapestry"));
    target.add("Keep me");
    let import = target.run(&["import", scroll.to_str().expect("utf8")]);
    assert_eq!(import.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&import.stderr).contains("hash chain is broken"));

    let threads = target.list_json();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["title"], "Keep me");
}

#[test]
fn test_cli_import_rejects_oversized_scroll() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));
    sandbox.add("Still here");

    let scroll = sandbox.path("huge.json");
    std::fs::write(&scroll, " ".repeat(5 * 1024 * 1024 + 1)).expect("write scroll");
    let import = sandbox.run(&["import", scroll.to_str().expect("utf8")]);
    assert_eq!(import.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&import.stderr).contains("limit is 5242880 bytes"));
    assert_eq!(sandbox.list_json().len(), 1);
}

#[test]
fn test_cli_encrypt_and_wrong_password() {
    let sandbox = Sandbox::new();
    let tapestry = sandbox.path("tapestry");
    sandbox.init(&tapestry);
    sandbox.add("PLAINTEXT_MARKER");

    let password = "correct-horse-battery";
    let encrypt = sandbox.run_with_password(password, &["encrypt"]);
    assert_success(&encrypt, "encrypt");

    let on_disk = std::fs::read_to_string(store_file(&tapestry)).expect("read store");
    assert!(on_disk.contains("AEGIS_SECURE"));
    assert!(!on_disk.contains("PLAINTEXT_MARKER"));

    let wrong = sandbox.run_with_password("wrong-password-1", &["list", "--json"]);
    assert_eq!(wrong.status.code(), Some(5));

    let missing = sandbox.run(&["list", "--json"]);
    assert_eq!(missing.status.code(), Some(5));

    let list = sandbox.run_with_password(password, &["list", "--json"]);
    assert_success(&list, "list");
    assert!(String::from_utf8_lossy(&list.stdout).contains("PLAINTEXT_MARKER"));

    // Writes made while unlocked stay encrypted.
    let add = sandbox.run_with_password(
        password,
        &[
            "add",
            "--intention",
            "serenity",
            "--time",
            "night",
            "--region",
            "lake",
            "--title",
            "SECOND_MARKER",
        ],
    );
    assert_success(&add, "add encrypted");
    let on_disk = std::fs::read_to_string(store_file(&tapestry)).expect("read store");
    assert!(on_disk.contains("AEGIS_SECURE"));
    assert!(!on_disk.contains("SECOND_MARKER"));
}

#[test]
fn test_cli_encrypt_rejects_short_password() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));

    let encrypt = sandbox.run_with_password("short", &["encrypt"]);
    assert_eq!(encrypt.status.code(), Some(4));
}

#[test]
fn test_cli_decrypt_restores_plain_json() {
    let sandbox = Sandbox::new();
    let tapestry = sandbox.path("tapestry");
    sandbox.init(&tapestry);
    sandbox.add("Back to plain");

    let password = "plain-again-password";
    assert_success(&sandbox.run_with_password(password, &["encrypt"]), "encrypt");
    assert_success(&sandbox.run_with_password(password, &["decrypt"]), "decrypt");

    let on_disk = std::fs::read_to_string(store_file(&tapestry)).expect("read store");
    let value: serde_json::Value = serde_json::from_str(&on_disk).expect("plain json");
    assert_eq!(value[0]["title"], "Back to plain");
    assert_eq!(sandbox.list_json().len(), 1);
}

#[test]
fn test_cli_verify_detects_tampering() {
    let sandbox = Sandbox::new();
    let tapestry = sandbox.path("tapestry");
    sandbox.init(&tapestry);
    sandbox.add("Untouched");
    sandbox.add("Also untouched");

    let verify = sandbox.run(&["verify"]);
    assert_success(&verify, "verify");
    assert!(String::from_utf8_lossy(&verify.stdout).contains("Integrity check: OK"));

    let path = store_file(&tapestry);
    let contents = std::fs::read_to_string(&path).expect("read store");
    std::fs::write(&path, contents.replace("Untouched", "Rewritten")).expect("tamper");

    let verify = sandbox.run(&["verify"]);
    assert_eq!(verify.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&verify.stderr);
    assert!(stderr.contains("Integrity check: FAILED"));
    assert!(stderr.contains("first broken thread: #1"));
}

#[test]
fn test_cli_missing_config() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["list"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("marq init"));
}

#[test]
fn test_cli_clear_requires_confirmation() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));
    sandbox.add("Soon gone");

    let refused = sandbox.run(&["clear"]);
    assert_eq!(refused.status.code(), Some(4));
    assert_eq!(sandbox.list_json().len(), 1);

    assert_success(&sandbox.run(&["clear", "--yes"]), "clear");
    assert!(sandbox.list_json().is_empty());
}

#[test]
fn test_cli_status_reports_lock_state() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));
    sandbox.add("Counted");

    let status = sandbox.run(&["status"]);
    assert_success(&status, "status");
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("Status: READY"));
    assert!(stdout.contains("Threads: 1"));

    assert_success(
        &sandbox.run_with_password("status-password", &["encrypt"]),
        "encrypt",
    );
    let status = sandbox.run(&["status"]);
    assert_success(&status, "status locked");
    let stdout = String::from_utf8_lossy(&status.stdout);
    assert!(stdout.contains("Status: LOCKED"));
    assert!(stdout.contains("Encryption: enabled"));
}

#[test]
fn test_cli_init_refuses_existing_config() {
    let sandbox = Sandbox::new();
    sandbox.init(&sandbox.path("tapestry"));
    let again = sandbox.run(&["init", sandbox.path("other").to_str().expect("utf8")]);
    assert_eq!(again.status.code(), Some(4));
}
