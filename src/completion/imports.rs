//! Import and package-path completion

use serde::Serialize;

use crate::index::SourceHit;

/// Directory prefixes that precede the package path in common layouts
const SOURCE_ROOTS: &[&str] = &["src/main/java/", "src/test/java/", "src/", "source/"];

/// One class offered on an `import` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportCandidate {
    pub simple_name: String,
    pub package: String,
    pub qualified_name: String,
    /// `simple_name\tpackage`
    pub label: String,
    /// `qualified.Name;`
    pub insertion: String,
}

impl ImportCandidate {
    pub fn from_qualified_name(qualified_name: &str) -> Self {
        let (package, simple_name) = qualified_name.rsplit_once('.').unwrap_or(("", qualified_name));
        Self {
            simple_name: simple_name.to_string(),
            package: package.to_string(),
            qualified_name: qualified_name.to_string(),
            label: format!("{}\t{}", simple_name, package),
            insertion: format!("{};", qualified_name),
        }
    }
}

/// Partial path typed on an `import` line, if `line` is one
///
/// `import static java.util.Coll;` gives `java.util.Coll`.
pub fn import_query(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix("static")
        .filter(|after| after.starts_with(char::is_whitespace))
        .map_or(rest, str::trim_start);
    let query = rest.trim_end().trim_end_matches(';').trim_end();
    (!query.is_empty()).then_some(query)
}

/// Dotted class name for a source path found by a partial search
pub fn qualified_name(hit: &SourceHit, extension: &str) -> String {
    qualified_name_from_path(hit.relative_path(), extension)
}

/// `src/main/java/com/app/Foo.java` -> `com.app.Foo`,
/// `java.base/java/util/List.java` -> `java.util.List`
pub fn qualified_name_from_path(path: &str, extension: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut path = normalized
        .strip_suffix(extension)
        .and_then(|p| p.strip_suffix('.'))
        .unwrap_or(normalized.as_str());

    if let Some(after) = SOURCE_ROOTS
        .iter()
        .find_map(|root| path.find(root).map(|idx| &path[idx + root.len()..]))
    {
        path = after;
    }

    // Module directories such as `java.base/` in modern toolchain archives
    if let Some((first, rest)) = path.split_once('/') {
        if first.contains('.') {
            path = rest;
        }
    }

    path.trim_start_matches('/').replace('/', ".")
}

/// Qualified names for `hits`, de-duplicated in order
pub fn qualified_names(hits: &[SourceHit], extension: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(hits.len());
    for hit in hits {
        let name = qualified_name(hit, extension);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
