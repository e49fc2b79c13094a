//! Watch a Go package and every non-standard-library package it imports,
//! returning once when any of their source files change.
//!
//! Pipeline: [`parser::extract_imports`] → [`resolver::resolve_imports`] →
//! [`WatchSet::build`] → [`ChangeMonitor::run`].

pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod watch_set;
pub mod watcher;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use config::Config;
pub use error::{ParseError, SubscriptionError, WatchError};
pub use watch_set::WatchSet;
pub use watcher::NotifySource;
pub use watcher::event::WatchOutcome;
pub use watcher::monitor::{ChangeMonitor, DebounceMode};

use parser::{ImportIdentifier, ParseOptions};
use resolver::{GoEnv, GoResolver, PackageResolver, ResolvedPackage};

/// Everything decided before any subscription is made.
#[derive(Debug, Clone, Serialize)]
pub struct WatchPlan {
    /// Canonical root package directory.
    pub root: PathBuf,
    /// Imports found in the root package, after `ignore_imports` filtering.
    #[serde(skip)]
    pub imports: Vec<ImportIdentifier>,
    /// Non-standard-library imports that resolved to a directory.
    pub resolved: Vec<ResolvedPackage>,
    pub watch_set: WatchSet,
}

/// Work out what to watch for the package at `root`, using the detected Go environment.
pub fn plan_watch(root: &Path, config: &Config) -> Result<WatchPlan, WatchError> {
    let env = GoEnv::detect(config.goroot.as_deref(), config.gopath.as_deref());
    plan_watch_with(root, config, &GoResolver::new(env))
}

/// Like [`plan_watch`] with an explicit resolver.
///
/// # Errors
/// [`WatchError::Parse`] when the root package cannot be read or parsed.
pub fn plan_watch_with<R: PackageResolver + ?Sized>(
    root: &Path,
    config: &Config,
    package_resolver: &R,
) -> Result<WatchPlan, WatchError> {
    let options = ParseOptions {
        include_tests: config.include_tests,
    };
    let mut imports = parser::extract_imports(root, options)?;
    imports.retain(|import| {
        let ignored = config.is_import_ignored(import.import_path());
        if ignored {
            debug!(import = import.import_path(), "import ignored by config");
        }
        !ignored
    });

    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let resolved = resolver::resolve_imports(package_resolver, &imports, &root);
    let watch_set = WatchSet::build(&root, &resolved);

    info!(
        root = %root.display(),
        imports = imports.len(),
        resolved = resolved.len(),
        watched = watch_set.len(),
        "planned watch"
    );

    Ok(WatchPlan {
        root,
        imports,
        resolved,
        watch_set,
    })
}

/// Watch an already-planned set of directories with the platform watcher.
pub async fn watch_plan(
    plan: &WatchPlan,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<WatchOutcome, WatchError> {
    let (source, events) = NotifySource::new()?;
    ChangeMonitor::from_config(config, &plan.root)
        .run(source, events, &plan.watch_set, cancel)
        .await
}

/// Watch the package at `root` and its imports; return on the first debounced change.
///
/// Setup failures (unparsable root, watcher unavailable) are returned as
/// errors before anything is watched.
pub async fn watch_package(
    root: &Path,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<WatchOutcome, WatchError> {
    let plan = plan_watch(root, config)?;
    watch_plan(&plan, config, cancel).await
}

/// Blocking form of [`watch_package`] for callers without an async runtime.
pub fn watch_package_blocking(root: &Path, config: &Config) -> Result<WatchOutcome, WatchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WatchError::Runtime)?;
    runtime.block_on(watch_package(root, config, &CancellationToken::new()))
}
