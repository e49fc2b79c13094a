use tree_sitter::Language;

/// Extension of the files the extractor parses.
pub const GO_EXTENSION: &str = "go";

/// Return the tree-sitter [`Language`] for the given file extension, or `None` if the extension
/// is not supported.
pub fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        GO_EXTENSION => Some(tree_sitter_go::LANGUAGE.into()),
        _ => None,
    }
}
