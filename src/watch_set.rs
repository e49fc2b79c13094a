use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::resolver::ResolvedPackage;

/// Deduplicated set of package directories to subscribe to.
///
/// Built once per watch call and never modified afterwards. The builder is the
/// only place that knows about both the root and the resolved imports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WatchSet {
    dirs: BTreeSet<PathBuf>,
}

impl WatchSet {
    /// Union of the root package directory and every resolved import directory.
    pub fn build(root: &Path, resolved: &[ResolvedPackage]) -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(normalize(root));
        for pkg in resolved {
            dirs.insert(normalize(&pkg.dir));
        }
        Self { dirs }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

impl<'a> IntoIterator for &'a WatchSet {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.dirs.iter()
    }
}

/// Canonical path when it exists, otherwise an absolute form of the input.
fn normalize(dir: &Path) -> PathBuf {
    dir.canonicalize()
        .or_else(|_| std::path::absolute(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pkg(import_path: &str, dir: &Path) -> ResolvedPackage {
        ResolvedPackage {
            import_path: import_path.to_owned(),
            dir: dir.to_path_buf(),
            is_std: false,
        }
    }

    #[test]
    fn test_root_plus_imports() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        let app = base.join("app");
        let lib = base.join("lib");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&lib).unwrap();

        let set = WatchSet::build(&app, &[pkg("example.com/lib", &lib)]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&app));
        assert!(set.contains(&lib));
    }

    #[test]
    fn test_duplicates_collapse() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        let app = base.join("app");
        let lib = base.join("lib");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&lib).unwrap();

        let resolved = [
            pkg("example.com/lib", &lib),
            pkg("example.com/lib/", &lib),
            pkg("./", &app),
        ];
        let set = WatchSet::build(&app, &resolved);
        assert_eq!(set.len(), 2, "N+1 bound with duplicates removed");
    }

    #[test]
    fn test_relative_root_becomes_absolute() {
        let set = WatchSet::build(Path::new("does/not/exist"), &[]);
        assert_eq!(set.len(), 1);
        assert!(set.iter().all(Path::is_absolute));
    }
}
