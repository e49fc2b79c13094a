use std::path::{Path, PathBuf};

use super::go_env::GoEnv;
use super::go_mod::{GoMod, ReplaceTarget, find_go_mod, has_path_prefix};
use super::{PackageResolver, ResolutionOutcome, ResolvedPackage};

/// Locates Go packages the way `go build` does, without invoking it.
///
/// Lookup order:
/// 1. relative imports (`./x`) against the importing directory
/// 2. `<GOROOT>/src`
/// 3. module mode: main module, `vendor/` (when `vendor/modules.txt` exists),
///    `replace` directives, then `require`d modules in the module cache
/// 4. GOPATH mode: `vendor/` directories above the importer, then `<GOPATH>/src`
///
/// Standard-library classification is by location: a package is std when its
/// canonical directory lies under the canonical GOROOT.
#[derive(Debug, Clone)]
pub struct GoResolver {
    env: GoEnv,
    canonical_goroot: Option<PathBuf>,
}

impl GoResolver {
    pub fn new(env: GoEnv) -> Self {
        let canonical_goroot = env
            .goroot
            .as_deref()
            .and_then(|root| root.canonicalize().ok());
        Self {
            env,
            canonical_goroot,
        }
    }

    fn candidates(&self, import_path: &str, base_dir: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if import_path.starts_with("./") || import_path.starts_with("../") {
            candidates.push(base_dir.join(import_path));
            return candidates;
        }

        if let Some(goroot) = &self.env.goroot {
            candidates.push(goroot.join("src").join(import_path));
        }

        let module = if self.env.module_mode {
            find_go_mod(base_dir)
        } else {
            None
        };

        match module {
            Some((module_root, go_mod)) => {
                self.module_candidates(import_path, &module_root, &go_mod, &mut candidates);
            }
            None => {
                for ancestor in base_dir.ancestors() {
                    candidates.push(ancestor.join("vendor").join(import_path));
                }
                for gopath in &self.env.gopath {
                    candidates.push(gopath.join("src").join(import_path));
                }
            }
        }

        candidates
    }

    fn module_candidates(
        &self,
        import_path: &str,
        module_root: &Path,
        go_mod: &GoMod,
        out: &mut Vec<PathBuf>,
    ) {
        if let Some(module_path) = &go_mod.module
            && has_path_prefix(import_path, module_path)
        {
            out.push(join_rest(module_root, import_path, module_path));
            return;
        }

        if module_root.join("vendor").join("modules.txt").is_file() {
            out.push(module_root.join("vendor").join(import_path));
        }

        if let Some(replace) = go_mod.replace_for(import_path) {
            match &replace.target {
                ReplaceTarget::Local(dir) => {
                    out.push(join_rest(&module_root.join(dir), import_path, &replace.old_path));
                }
                ReplaceTarget::Module { path, version } => {
                    if let Some(dir) = self.module_cache_dir(path, version) {
                        out.push(join_rest(&dir, import_path, &replace.old_path));
                    }
                }
            }
            return;
        }

        if let Some(require) = go_mod.require_for(import_path)
            && let Some(dir) = self.module_cache_dir(&require.path, &require.version)
        {
            out.push(join_rest(&dir, import_path, &require.path));
        }
    }

    fn module_cache_dir(&self, module_path: &str, version: &str) -> Option<PathBuf> {
        let cache = self.env.gomodcache.as_ref()?;
        Some(cache.join(format!(
            "{}@{}",
            escape_module_path(module_path),
            escape_module_path(version)
        )))
    }
}

impl PackageResolver for GoResolver {
    fn resolve(&self, import_path: &str, base_dir: &Path) -> ResolutionOutcome {
        if import_path.is_empty() {
            return ResolutionOutcome::Unresolved("empty import path".to_owned());
        }
        if import_path == "C" {
            return ResolutionOutcome::Unresolved("cgo pseudo-package".to_owned());
        }

        let candidates = self.candidates(import_path, base_dir);
        let Some(found) = candidates.iter().find(|dir| dir.is_dir()) else {
            return ResolutionOutcome::Unresolved(format!(
                "cannot find package {import_path:?} in any of {candidates:?}"
            ));
        };

        let dir = match found.canonicalize() {
            Ok(dir) => dir,
            Err(err) => {
                return ResolutionOutcome::Unresolved(format!(
                    "cannot canonicalize {}: {err}",
                    found.display()
                ));
            }
        };

        let is_std = self
            .canonical_goroot
            .as_deref()
            .is_some_and(|goroot| dir.starts_with(goroot));

        ResolutionOutcome::Resolved(ResolvedPackage {
            import_path: import_path.to_owned(),
            dir,
            is_std,
        })
    }
}

/// Join the part of `import_path` after `prefix` onto `dir`.
fn join_rest(dir: &Path, import_path: &str, prefix: &str) -> PathBuf {
    let rest = import_path[prefix.len()..].trim_start_matches('/');
    if rest.is_empty() {
        dir.to_path_buf()
    } else {
        dir.join(rest)
    }
}

/// Module cache escaping: every upper-case letter becomes `!` plus its lower-case form.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
