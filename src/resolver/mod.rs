pub mod go_env;
pub mod go_mod;
pub mod go_resolver;

pub use go_env::GoEnv;
pub use go_resolver::GoResolver;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::parser::ImportIdentifier;

/// A package import mapped to its directory on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    /// Import path with quotes removed.
    pub import_path: String,
    /// Absolute, canonical package directory.
    pub dir: PathBuf,
    /// True if `dir` is part of the Go distribution.
    pub is_std: bool,
}

/// The outcome of resolving a single import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved(ResolvedPackage),
    /// The import could not be located. `String` contains a human-readable reason.
    Unresolved(String),
}

/// Maps an import path to a package directory.
///
/// `base_dir` is the directory of the importing package; module, vendor and
/// relative lookups are anchored there.
pub trait PackageResolver {
    fn resolve(&self, import_path: &str, base_dir: &Path) -> ResolutionOutcome;
}

/// Resolve every identifier and keep only non-standard-library packages.
///
/// Unresolvable imports are skipped without affecting the others: a package can
/// still build when some imports resolve differently (build tags, platform files),
/// and watching is advisory. Output follows input order.
pub fn resolve_imports<R: PackageResolver + ?Sized>(
    resolver: &R,
    imports: &[ImportIdentifier],
    base_dir: &Path,
) -> Vec<ResolvedPackage> {
    let mut resolved = Vec::new();

    for import in imports {
        let import_path = import.import_path();
        match resolver.resolve(import_path, base_dir) {
            ResolutionOutcome::Resolved(pkg) if pkg.is_std => {
                debug!(import = import_path, "skipping standard library package");
            }
            ResolutionOutcome::Resolved(pkg) => {
                debug!(import = import_path, dir = %pkg.dir.display(), "resolved import");
                resolved.push(pkg);
            }
            ResolutionOutcome::Unresolved(reason) => {
                debug!(
                    import = import_path,
                    file = %import.file.display(),
                    line = import.line,
                    reason = %reason,
                    "skipping unresolved import"
                );
            }
        }
    }

    resolved
}
