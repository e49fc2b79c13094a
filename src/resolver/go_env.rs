use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// The Go toolchain settings that drive package lookup.
#[derive(Debug, Clone, Default)]
pub struct GoEnv {
    /// Root of the Go distribution; `<goroot>/src` holds the standard library.
    pub goroot: Option<PathBuf>,
    /// GOPATH workspaces, in search order.
    pub gopath: Vec<PathBuf>,
    /// Module download cache (`GOMODCACHE`).
    pub gomodcache: Option<PathBuf>,
    /// False when `GO111MODULE=off`.
    pub module_mode: bool,
}

impl GoEnv {
    /// Detect settings from the environment, with explicit overrides taking precedence.
    ///
    /// GOROOT falls back to `go env GOROOT` when the variable is unset, GOPATH
    /// to `$HOME/go`, and GOMODCACHE to `<first GOPATH>/pkg/mod`.
    pub fn detect(goroot: Option<&Path>, gopath: Option<&[PathBuf]>) -> Self {
        let goroot = goroot
            .map(Path::to_path_buf)
            .or_else(|| non_empty_var("GOROOT").map(PathBuf::from))
            .or_else(go_env_goroot);

        let gopath: Vec<PathBuf> = match gopath {
            Some(paths) => paths.to_vec(),
            None => match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
                Some(value) => std::env::split_paths(&value).collect(),
                None => dirs::home_dir()
                    .map(|home| vec![home.join("go")])
                    .unwrap_or_default(),
            },
        };

        let gomodcache = non_empty_var("GOMODCACHE")
            .map(PathBuf::from)
            .or_else(|| gopath.first().map(|p| p.join("pkg").join("mod")));

        let module_mode = non_empty_var("GO111MODULE").as_deref() != Some("off");

        let env = GoEnv {
            goroot,
            gopath,
            gomodcache,
            module_mode,
        };
        debug!(?env, "detected go environment");
        env
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Ask the toolchain for GOROOT. `None` when `go` is not installed.
fn go_env_goroot() -> Option<PathBuf> {
    let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8(output.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}
