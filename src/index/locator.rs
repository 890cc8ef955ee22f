//! Filesystem search for class source files
//!
//! Roots are searched in configured order, each depth-first with entries sorted by
//! file name so results do not depend on directory listing order.

use std::path::{Path, PathBuf};

use tracing::{trace, warn};
use walkdir::WalkDir;

/// How a class name is compared against candidate paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// File stem equals the name (case-insensitive), or the path ends with a
    /// `/`-qualified name
    Exact,
    /// File stem, or for qualified names the whole path, contains the name
    Partial,
}

/// A normalized class-name query shared by the filesystem and archive backends
#[derive(Debug, Clone)]
pub struct NameQuery {
    needle: String,
    qualified: bool,
    mode: MatchMode,
}

impl NameQuery {
    /// `name` may be `Foo`, `java/util/List`, or `java.util.Li` (dots become slashes)
    pub fn new(name: &str, mode: MatchMode) -> Self {
        let needle = name.trim().replace(['.', '\\'], "/").to_lowercase();
        let qualified = needle.contains('/');
        Self {
            needle,
            qualified,
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Tests a `/`-separated path whose extension has already been checked
    pub fn matches(&self, path: &str, extension: &str) -> bool {
        let lowered = path.replace('\\', "/").to_lowercase();
        let Some(without_ext) = lowered
            .strip_suffix(&extension.to_lowercase())
            .and_then(|rest| rest.strip_suffix('.'))
        else {
            return false;
        };
        let stem = without_ext.rsplit('/').next().unwrap_or(without_ext);

        match (self.mode, self.qualified) {
            (MatchMode::Exact, false) => stem == self.needle,
            (MatchMode::Exact, true) => {
                without_ext == self.needle || without_ext.ends_with(&format!("/{}", self.needle))
            }
            (MatchMode::Partial, false) => stem.contains(&self.needle),
            (MatchMode::Partial, true) => without_ext.contains(&self.needle),
        }
    }
}

/// Depth-first search over the configured project roots
#[derive(Debug, Clone)]
pub struct SourceLocator {
    roots: Vec<PathBuf>,
    extension: String,
}

impl SourceLocator {
    pub fn new(roots: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            roots,
            extension: extension.into(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// First file whose name matches `class_name` exactly, searching roots in order
    pub fn find_class(&self, class_name: &str) -> Option<PathBuf> {
        let query = NameQuery::new(class_name, MatchMode::Exact);
        if query.is_empty() {
            return None;
        }
        let found = self
            .roots
            .iter()
            .find_map(|root| self.walk(root, &query).next());
        if found.is_none() {
            trace!("No source file for {} under {} roots", class_name, self.roots.len());
        }
        found
    }

    /// Every file under every root matching `query`
    pub fn find_all(&self, query: &NameQuery) -> Vec<PathBuf> {
        if query.is_empty() {
            return Vec::new();
        }
        self.roots
            .iter()
            .flat_map(|root| self.walk(root, query).collect::<Vec<_>>())
            .collect()
    }

    fn walk<'a>(&'a self, root: &'a Path, query: &'a NameQuery) -> impl Iterator<Item = PathBuf> + 'a {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable path under {:?}: {}", root, e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(move |entry| {
                entry
                    .path()
                    .strip_prefix(root)
                    .ok()
                    .and_then(Path::to_str)
                    .is_some_and(|relative| query.matches(relative, &self.extension))
            })
            .map(|entry| entry.into_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "class X {}").unwrap();
    }

    #[test]
    fn test_name_query_modes() {
        let exact = NameQuery::new("arraylist", MatchMode::Exact);
        assert!(exact.matches("java/util/ArrayList.java", "java"));
        assert!(!exact.matches("java/util/ArrayListSpliterator.java", "java"));
        assert!(!exact.matches("java/util/ArrayList.kt", "java"));

        let qualified = NameQuery::new("java.util.List", MatchMode::Exact);
        assert!(qualified.matches("java.base/java/util/List.java", "java"));
        assert!(!qualified.matches("java/awt/List.java", "java"));

        let partial = NameQuery::new("Array", MatchMode::Partial);
        assert!(partial.matches("java/util/ArrayList.java", "java"));
        assert!(partial.matches("java/lang/reflect/Array.java", "java"));
        assert!(!partial.matches("java/util/Arrays/List.java", "java"));

        let package = NameQuery::new("java.util.Ha", MatchMode::Partial);
        assert!(package.matches("src/java/util/HashMap.java", "java"));
    }

    #[test]
    fn test_find_class_prefers_first_root_and_sorted_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(first.path(), "b/Foo.java");
        touch(first.path(), "a/foo.java");
        touch(second.path(), "Foo.java");

        let locator = SourceLocator::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            "java",
        );
        let found = locator.find_class("Foo").unwrap();
        assert_eq!(found, first.path().join("a/foo.java"));
        assert!(locator.find_class("Missing").is_none());
        assert!(locator.find_class("").is_none());
    }

    #[test]
    fn test_find_all_aggregates_roots() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(first.path(), "com/app/UserService.java");
        touch(second.path(), "com/lib/UserRepository.java");
        touch(second.path(), "com/lib/Other.java");

        let locator = SourceLocator::new(
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
            "java",
        );
        let found = locator.find_all(&NameQuery::new("User", MatchMode::Partial));
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("UserService.java"));
        assert!(found[1].ends_with("UserRepository.java"));
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let locator = SourceLocator::new(vec![PathBuf::from("/no/such/root")], "java");
        assert!(locator.find_class("Foo").is_none());
    }
}
