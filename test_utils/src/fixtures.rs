//! On-disk fixtures: throwaway project trees and library source archives.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indoc::indoc;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

/// A temporary project root that is removed when dropped
pub struct ProjectTree {
    dir: TempDir,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp project dir"),
        }
    }

    /// Creates a project holding each `(relative path, contents)` pair
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let tree = Self::new();
        for (relative, contents) in files {
            tree.write(relative, contents);
        }
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes `contents` at `relative`, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture dirs");
        }
        fs::write(&path, contents).expect("failed to write fixture file");
        path
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a zip archive at `path` holding each `(entry name, contents)` pair
pub fn write_source_archive(path: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let file = fs::File::create(path).expect("failed to create archive");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default();
    for (name, contents) in entries {
        zip.start_file(*name, options).expect("failed to start archive entry");
        zip.write_all(contents.as_bytes()).expect("failed to write archive entry");
    }
    zip.finish().expect("failed to finish archive");
    path.to_path_buf()
}

/// A trimmed-down `java.lang.String`
pub const STRING_SOURCE: &str = indoc! {r#"
    package java.lang;

    public final class String implements CharSequence, Comparable<String> {
        private final byte[] value;

        public String() {}
        public String(String original) {}

        public int length() { return value.length; }
        public boolean isEmpty() { return value.length == 0; }
        public char charAt(int index) { return 'a'; }
        public String substring(int beginIndex, int endIndex) { return this; }
        public String trim() { return this; }
        public static String valueOf(Object obj) { return null; }
    }
"#};

/// A trimmed-down `java.util.ArrayList`
pub const ARRAY_LIST_SOURCE: &str = indoc! {r#"
    package java.util;

    public class ArrayList<E> extends AbstractList<E> implements List<E> {
        private int size;

        public ArrayList() {}
        public ArrayList(int initialCapacity) {}

        public E get(int index) { return null; }
        public boolean add(E e) { return true; }
        public int size() { return size; }
    }
"#};

/// A trimmed-down `java.util.HashMap`
pub const HASH_MAP_SOURCE: &str = indoc! {r#"
    package java.util;

    public class HashMap<K, V> extends AbstractMap<K, V> implements Map<K, V> {
        public HashMap() {}

        public V get(Object key) { return null; }
        public V put(K key, V value) { return null; }
        public Set<K> keySet() { return null; }
    }
"#};

/// An archive laid out like a modern toolchain's `src.zip`
pub fn write_library_archive(dir: &Path) -> PathBuf {
    write_source_archive(
        &dir.join("src.zip"),
        &[
            ("java.base/java/lang/String.java", STRING_SOURCE),
            ("java.base/java/util/ArrayList.java", ARRAY_LIST_SOURCE),
            ("java.base/java/util/HashMap.java", HASH_MAP_SOURCE),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_tree_writes_nested_paths() {
        let tree = ProjectTree::with_files(&[("src/com/app/Foo.java", "class Foo {}")]);
        assert_eq!(fs::read_to_string(tree.path("src/com/app/Foo.java")).unwrap(), "class Foo {}");
    }

    #[test]
    fn test_library_archive_lists_entries() {
        let tree = ProjectTree::new();
        let path = write_library_archive(tree.root());
        let archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
    }
}
