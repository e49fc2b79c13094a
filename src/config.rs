use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::watcher::monitor::{DEFAULT_SETTLE, DebounceMode};

/// File name looked up in the watched root.
pub const CONFIG_FILE: &str = "pkgwatch.toml";

/// Configuration loaded from `pkgwatch.toml` at the package root.
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Extension (without the dot) of files whose changes are relevant.
    pub extension: String,
    /// Settle delay after the first relevant change, in milliseconds.
    pub settle_ms: u64,
    /// `fixed` sleeps once then drains; `quiet` waits for a full quiet period.
    pub debounce: DebounceMode,
    /// Give up after this many seconds without a change.
    pub timeout_secs: Option<u64>,
    /// Parse `_test.go` files when extracting imports.
    pub include_tests: bool,
    /// Glob patterns of import paths never to watch (e.g. `github.com/big/sdk/*`).
    pub ignore_imports: Vec<String>,
    /// Ignore events on paths matched by the root's `.gitignore`.
    pub respect_gitignore: bool,
    /// Overrides `$GOROOT` / `go env GOROOT`.
    pub goroot: Option<PathBuf>,
    /// Overrides `$GOPATH`.
    pub gopath: Option<Vec<PathBuf>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: "go".to_owned(),
            settle_ms: DEFAULT_SETTLE.as_millis() as u64,
            debounce: DebounceMode::default(),
            timeout_secs: None,
            include_tests: true,
            ignore_imports: Vec::new(),
            respect_gitignore: false,
            goroot: None,
            gopath: None,
        }
    }
}

impl Config {
    /// Load configuration from `pkgwatch.toml` in the given root directory.
    ///
    /// Returns a default configuration if the file does not exist or cannot be parsed.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                warn!(path = %config_path.display(), error = %err, "failed to parse config, using defaults");
                Self::default()
            }),
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Extension with any leading dot removed, so `.go` and `go` both work.
    pub fn normalized_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Returns true if `import_path` matches one of `ignore_imports`.
    pub fn is_import_ignored(&self, import_path: &str) -> bool {
        self.ignore_imports.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(import_path))
                .unwrap_or(false)
        })
    }
}
