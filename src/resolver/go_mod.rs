use std::path::{Path, PathBuf};

use tracing::warn;

pub const GO_MOD_FILE: &str = "go.mod";

/// A `require` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
}

/// Right-hand side of a `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// A directory, relative to the `go.mod` that declares it or absolute.
    Local(PathBuf),
    /// Another module version, served from the module cache.
    Module { path: String, version: String },
}

/// A `replace` directive. `old_version` is `None` when every version is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    pub old_version: Option<String>,
    pub target: ReplaceTarget,
}

/// The subset of a `go.mod` file that matters for locating packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: Option<String>,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

impl GoMod {
    /// Parse `go.mod` contents.
    ///
    /// Unknown directives (`go`, `toolchain`, `exclude`, `retract`, ...) and
    /// malformed lines are skipped rather than reported.
    pub fn parse(contents: &str) -> Self {
        let mut go_mod = GoMod::default();
        let mut block: Option<String> = None;

        for line in contents.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();

            if let Some(verb) = &block {
                if tokens == [")"] {
                    block = None;
                } else {
                    go_mod.apply(verb, &tokens);
                }
                continue;
            }

            let (verb, args) = (tokens[0], &tokens[1..]);
            if args == ["("] {
                block = Some(verb.to_owned());
            } else {
                go_mod.apply(verb, args);
            }
        }

        go_mod
    }

    fn apply(&mut self, verb: &str, args: &[&str]) {
        match verb {
            "module" => {
                if let Some(path) = args.first() {
                    self.module = Some(unquote(path).to_owned());
                }
            }
            "require" => {
                if let [path, version, ..] = args {
                    self.requires.push(Require {
                        path: unquote(path).to_owned(),
                        version: unquote(version).to_owned(),
                    });
                }
            }
            "replace" => {
                if let Some(replace) = parse_replace(args) {
                    self.replaces.push(replace);
                }
            }
            _ => {}
        }
    }

    /// The longest `require`d module path that prefixes `import_path`.
    pub fn require_for(&self, import_path: &str) -> Option<&Require> {
        self.requires
            .iter()
            .filter(|r| has_path_prefix(import_path, &r.path))
            .max_by_key(|r| r.path.len())
    }

    /// The `replace` that applies to `import_path`, longest module path first.
    ///
    /// A versioned replace only applies when the module is required at that version.
    pub fn replace_for(&self, import_path: &str) -> Option<&Replace> {
        self.replaces
            .iter()
            .filter(|r| has_path_prefix(import_path, &r.old_path))
            .filter(|r| match &r.old_version {
                None => true,
                Some(v) => self
                    .requires
                    .iter()
                    .any(|req| req.path == r.old_path && &req.version == v),
            })
            .max_by_key(|r| r.old_path.len())
    }
}

fn parse_replace(args: &[&str]) -> Option<Replace> {
    let arrow = args.iter().position(|t| *t == "=>")?;
    let (lhs, rhs) = (&args[..arrow], &args[arrow + 1..]);

    let old_path = unquote(lhs.first()?).to_owned();
    let old_version = lhs.get(1).map(|v| unquote(v).to_owned());

    let new_path = unquote(rhs.first()?);
    let target = match rhs.get(1) {
        Some(version) if !is_local_path(new_path) => ReplaceTarget::Module {
            path: new_path.to_owned(),
            version: unquote(version).to_owned(),
        },
        None if is_local_path(new_path) => ReplaceTarget::Local(PathBuf::from(new_path)),
        _ => return None,
    };

    Some(Replace {
        old_path,
        old_version,
        target,
    })
}

fn is_local_path(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../") || Path::new(path).is_absolute()
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn unquote(token: &str) -> &str {
    token.trim_matches(|c| c == '"' || c == '`')
}

/// True if `path` equals `prefix` or continues it with a `/` element boundary.
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Find the nearest `go.mod` at or above `dir` and parse it.
///
/// Returns the directory containing the file together with its contents.
pub fn find_go_mod(dir: &Path) -> Option<(PathBuf, GoMod)> {
    for ancestor in dir.ancestors() {
        let candidate = ancestor.join(GO_MOD_FILE);
        if !candidate.is_file() {
            continue;
        }
        return match std::fs::read_to_string(&candidate) {
            Ok(contents) => Some((ancestor.to_path_buf(), GoMod::parse(&contents))),
            Err(err) => {
                warn!(path = %candidate.display(), error = %err, "cannot read go.mod");
                None
            }
        };
    }
    None
}
