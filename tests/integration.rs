/// Integration test suite for the `pkgwatch` binary.
///
/// All tests invoke the compiled binary via subprocess against a throwaway Go
/// workspace (fake GOROOT, a module with an `app` and a `lib` package). The Go
/// environment variables are set explicitly so the host toolchain is never
/// consulted.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pkgwatch"))
}

struct Workspace {
    _tmp: TempDir,
    base: PathBuf,
}

impl Workspace {
    /// `proj/app` imports `strings` (std) and `example.com/proj/lib`.
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let base = tmp.path().canonicalize().unwrap();

        let strings = base.join("goroot/src/strings");
        fs::create_dir_all(&strings).unwrap();
        fs::write(strings.join("strings.go"), "package strings\n").unwrap();
        fs::create_dir_all(base.join("gopath")).unwrap();

        fs::create_dir_all(base.join("proj/app")).unwrap();
        fs::create_dir_all(base.join("proj/lib")).unwrap();
        fs::write(base.join("proj/go.mod"), "module example.com/proj\n\ngo 1.22\n").unwrap();
        fs::write(
            base.join("proj/app/main.go"),
            "package main\n\nimport (\n\t\"strings\"\n\n\t\"example.com/proj/lib\"\n)\n\nfunc main() { lib.Do(strings.ToUpper(\"x\")) }\n",
        )
        .unwrap();
        fs::write(
            base.join("proj/lib/lib.go"),
            "package lib\n\nfunc Do(s string) {}\n",
        )
        .unwrap();

        Self { _tmp: tmp, base }
    }

    fn app(&self) -> PathBuf {
        self.base.join("proj/app")
    }

    fn lib(&self) -> PathBuf {
        self.base.join("proj/lib")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(binary());
        cmd.args(args)
            .env("GOROOT", self.base.join("goroot"))
            .env("GOPATH", self.base.join("gopath"))
            .env("GOMODCACHE", self.base.join("gopath/pkg/mod"))
            .env("GO111MODULE", "on")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("failed to invoke pkgwatch binary")
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

// ---------------------------------------------------------------------------
// deps
// ---------------------------------------------------------------------------

/// test_deps_lists_root_and_non_std_imports — std `strings` is left out.
#[test]
fn test_deps_lists_root_and_non_std_imports() {
    let ws = Workspace::new();
    let out = ws.run(&["deps", path_arg(&ws.app())]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let lines: Vec<PathBuf> = stdout(&out).lines().map(PathBuf::from).collect();
    assert_eq!(lines.len(), 2, "stdout: {}", stdout(&out));
    assert!(lines.contains(&ws.app()));
    assert!(lines.contains(&ws.lib()));
}

/// test_deps_json_output — JSON plan carries root, resolved imports and watch set.
#[test]
fn test_deps_json_output() {
    let ws = Workspace::new();
    let out = ws.run(&["deps", "--json", path_arg(&ws.app())]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&out)).expect("deps --json output is not valid JSON");
    assert_eq!(parsed["watch_set"].as_array().map(Vec::len), Some(2));
    let resolved = parsed["resolved"].as_array().expect("resolved array");
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0]["import_path"], "example.com/proj/lib");
    assert_eq!(resolved[0]["is_std"], false);
}

/// test_deps_missing_root_fails — parse error surfaces and exits non-zero.
#[test]
fn test_deps_missing_root_fails() {
    let ws = Workspace::new();
    let missing = ws.base.join("proj/nope");
    let out = ws.run(&["deps", path_arg(&missing)]);
    assert!(!out.status.success());
    assert!(
        stderr(&out).contains("cannot read package directory"),
        "stderr: {}",
        stderr(&out)
    );
}

// ---------------------------------------------------------------------------
// watch
// ---------------------------------------------------------------------------

/// test_watch_missing_root_returns_immediately — setup failure, exit status 1.
#[test]
fn test_watch_missing_root_returns_immediately() {
    let ws = Workspace::new();
    let missing = ws.base.join("proj/nope");
    let out = ws.run(&["watch", "--timeout-secs", "30", path_arg(&missing)]);
    assert_eq!(out.status.code(), Some(1), "stderr: {}", stderr(&out));
}

/// test_watch_times_out_without_changes — exit status 2 and a "timed out" line.
#[test]
fn test_watch_times_out_without_changes() {
    let ws = Workspace::new();
    let out = ws.run(&["watch", "--timeout-secs", "1", path_arg(&ws.app())]);
    assert_eq!(out.status.code(), Some(2), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("timed out"), "stdout: {}", stdout(&out));
}

/// test_watch_reports_change_in_imported_package — edit in lib wakes the watcher.
#[test]
fn test_watch_reports_change_in_imported_package() {
    let ws = Workspace::new();
    let child = ws
        .command(&["watch", "--json", "--timeout-secs", "20", path_arg(&ws.app())])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn pkgwatch");

    thread::sleep(Duration::from_millis(800));
    fs::write(ws.lib().join("lib.go"), "package lib\n\nfunc Do(s string) { _ = s }\n").unwrap();

    let out = child.wait_with_output().expect("wait for pkgwatch");
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let parsed: serde_json::Value =
        serde_json::from_str(stdout(&out).trim()).expect("watch --json output is not valid JSON");
    assert_eq!(parsed["outcome"], "changed");
    let changed = PathBuf::from(parsed["detail"].as_str().unwrap());
    assert!(changed.starts_with(ws.lib()), "changed path {changed:?}");
}
