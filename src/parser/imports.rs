use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// An import declared by a Go source file, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIdentifier {
    /// The literal token including its quotes, e.g. `"github.com/x/y"`.
    pub raw: String,
    /// Local name for aliased imports: an identifier, `_` or `.`.
    pub alias: Option<String>,
    /// File the import was found in.
    pub file: PathBuf,
    /// 1-based line of the import spec.
    pub line: usize,
}

impl ImportIdentifier {
    /// The import path with surrounding quote characters removed.
    pub fn import_path(&self) -> &str {
        trim_quotes(&self.raw)
    }
}

/// Strip the `"` or `` ` `` delimiters of a Go string literal.
pub fn trim_quotes(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '`')
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Matches every spec of both `import "x"` and grouped `import ( ... )` forms.
const IMPORT_SPEC_QUERY: &str = r#"
    (import_spec) @spec
"#;

static IMPORT_SPEC_QUERY_CACHE: OnceLock<Query> = OnceLock::new();

fn import_spec_query(language: &Language) -> &'static Query {
    IMPORT_SPEC_QUERY_CACHE.get_or_init(|| {
        Query::new(language, IMPORT_SPEC_QUERY).expect("invalid import_spec query")
    })
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Prologue validation
// ---------------------------------------------------------------------------

/// Check that the package clause and import declarations parsed cleanly.
///
/// Only the file prologue is inspected. Errors in declarations after the last
/// import do not matter for dependency discovery and are ignored, unless the
/// error recovery swallowed an `import` or `package` keyword or the error sits
/// on the line where the prologue ends. An import declaration after any other
/// declaration is rejected, as `go build` does.
pub fn validate_prologue(tree: &Tree, source: &[u8], file: &Path) -> Result<(), ParseError> {
    let root = tree.root_node();

    let mut cursor = root.walk();
    let children: Vec<Node> = root.children(&mut cursor).collect();

    let last_prologue = children
        .iter()
        .filter(|c| matches!(c.kind(), "package_clause" | "import_declaration"))
        .max_by_key(|c| c.end_byte());
    let prologue_end = last_prologue.map_or(0, |c| c.end_byte());
    let prologue_end_row = last_prologue.map_or(0, |c| c.end_position().row);

    let mut seen_package = false;
    let mut seen_declaration = false;
    for child in children {
        match child.kind() {
            "comment" => {}
            "package_clause" => {
                if child.has_error() {
                    return Err(syntax_error(file, child, "package clause"));
                }
                seen_package = true;
            }
            "import_declaration" => {
                if !seen_package {
                    return Err(syntax_error(file, child, "package clause"));
                }
                if seen_declaration || child.has_error() {
                    return Err(syntax_error(file, child, "import declaration"));
                }
            }
            _ if child.is_error() || child.is_missing() => {
                let text = node_text(child, source).trim_start();
                let swallowed_prologue = text.starts_with("import") || text.starts_with("package");
                let in_prologue = child.start_byte() <= prologue_end
                    || child.start_position().row == prologue_end_row;
                if in_prologue || swallowed_prologue {
                    let context = if seen_package {
                        "import declaration"
                    } else {
                        "package clause"
                    };
                    return Err(syntax_error(file, child, context));
                }
            }
            _ => seen_declaration = true,
        }
    }

    if !seen_package {
        return Err(ParseError::Syntax {
            file: file.to_path_buf(),
            line: 1,
            context: "package clause",
        });
    }

    Ok(())
}

fn syntax_error(file: &Path, node: Node, context: &'static str) -> ParseError {
    ParseError::Syntax {
        file: file.to_path_buf(),
        line: node.start_position().row + 1,
        context,
    }
}

// ---------------------------------------------------------------------------
// Import extraction
// ---------------------------------------------------------------------------

/// Extract all import specs from a parsed Go syntax tree.
pub fn extract_imports(
    tree: &Tree,
    source: &[u8],
    language: &Language,
    file: &Path,
) -> Vec<ImportIdentifier> {
    let mut imports = Vec::new();

    let query = import_spec_query(language);
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let spec = capture.node;
            let Some(path) = spec.child_by_field_name("path") else {
                continue;
            };
            let alias = spec
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_owned());

            imports.push(ImportIdentifier {
                raw: node_text(path, source).to_owned(),
                alias,
                file: file.to_path_buf(),
                line: spec.start_position().row + 1,
            });
        }
    }

    imports
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::languages::language_for_extension;

    fn parse_go(source: &str) -> (Tree, Language) {
        let lang = language_for_extension("go").unwrap();
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&lang).unwrap();
        let tree = parser.parse(source.as_bytes(), None).unwrap();
        (tree, lang)
    }

    fn imports_of(source: &str) -> Vec<ImportIdentifier> {
        let (tree, lang) = parse_go(source);
        extract_imports(&tree, source.as_bytes(), &lang, Path::new("main.go"))
    }

    #[test]
    fn test_single_import() {
        let imports = imports_of("package main\n\nimport \"fmt\"\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].raw, "\"fmt\"");
        assert_eq!(imports[0].import_path(), "fmt");
        assert_eq!(imports[0].line, 3);
        assert!(imports[0].alias.is_none());
    }

    #[test]
    fn test_grouped_imports_with_aliases() {
        let src = r#"package app

import (
	"strings"
	lib "example.com/proj/lib"
	_ "example.com/proj/driver"
	. "example.com/proj/dsl"
)
"#;
        let imports = imports_of(src);
        let paths: Vec<_> = imports.iter().map(|i| i.import_path()).collect();
        assert_eq!(
            paths,
            vec![
                "strings",
                "example.com/proj/lib",
                "example.com/proj/driver",
                "example.com/proj/dsl"
            ]
        );
        let aliases: Vec<_> = imports.iter().map(|i| i.alias.as_deref()).collect();
        assert_eq!(aliases, vec![None, Some("lib"), Some("_"), Some(".")]);
    }

    #[test]
    fn test_raw_string_import() {
        let imports = imports_of("package main\nimport `os`\n");
        assert_eq!(imports[0].raw, "`os`");
        assert_eq!(imports[0].import_path(), "os");
    }

    #[test]
    fn test_multiple_import_declarations() {
        let src = "package main\nimport \"fmt\"\nimport \"os\"\nfunc main() {}\n";
        assert_eq!(imports_of(src).len(), 2);
    }

    #[test]
    fn test_no_imports() {
        assert!(imports_of("package main\nfunc main() {}\n").is_empty());
    }

    #[test]
    fn test_valid_prologue() {
        let src = "// Package main.\npackage main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println() }\n";
        let (tree, _) = parse_go(src);
        assert!(validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).is_ok());
    }

    #[test]
    fn test_broken_body_is_ignored() {
        let src = "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println( }\n";
        let (tree, _) = parse_go(src);
        assert!(validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).is_ok());
    }

    #[test]
    fn test_broken_import_is_rejected() {
        let src = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\n)\n";
        let (tree, _) = parse_go(src);
        let err = validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }), "got {err:?}");
    }

    #[test]
    fn test_trailing_tokens_after_import_are_rejected() {
        let src = "package main\nimport \"fmt\" \"os\"\n";
        let (tree, _) = parse_go(src);
        let err = validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).unwrap_err();
        match err {
            ParseError::Syntax { line, context, .. } => {
                assert_eq!(line, 2);
                assert_eq!(context, "import declaration");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_import_after_declaration_is_rejected() {
        let src = "package main\nfunc f() {}\nimport \"os\"\n";
        let (tree, _) = parse_go(src);
        let err = validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).unwrap_err();
        match err {
            ParseError::Syntax { line, context, .. } => {
                assert_eq!(line, 3);
                assert_eq!(context, "import declaration");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_comment_after_import_is_accepted() {
        let src = "package main\nimport \"fmt\" // printing\n\nfunc main() {}\n";
        let (tree, _) = parse_go(src);
        assert!(validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).is_ok());
    }

    #[test]
    fn test_missing_package_clause_is_rejected() {
        let src = "import \"fmt\"\n";
        let (tree, _) = parse_go(src);
        let err = validate_prologue(&tree, src.as_bytes(), Path::new("main.go")).unwrap_err();
        match err {
            ParseError::Syntax { context, .. } => assert_eq!(context, "package clause"),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let src = "";
        let (tree, _) = parse_go(src);
        assert!(validate_prologue(&tree, src.as_bytes(), Path::new("empty.go")).is_err());
    }

    #[test]
    fn test_trim_quotes() {
        assert_eq!(trim_quotes("\"a/b\""), "a/b");
        assert_eq!(trim_quotes("`a/b`"), "a/b");
        assert_eq!(trim_quotes("a/b"), "a/b");
    }
}
