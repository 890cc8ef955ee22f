//! Structural models of parsed classes
//!
//! A [`ClassModel`] is built once by the extractor and never mutated afterwards; a
//! re-parse produces a fresh model that replaces the old one wholesale. Nested classes
//! are owned by their parent and are only reachable through it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

/// Declared access modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    /// The `default` keyword (interface default members)
    Default,
}

impl Visibility {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            "default" => Some(Self::Default),
            _ => None,
        }
    }

    pub fn is_private(self) -> bool {
        self == Self::Private
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Interface,
    Enum,
    Record,
}

impl DeclarationKind {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "enum" => Some(Self::Enum),
            "record" => Some(Self::Record),
            _ => None,
        }
    }
}

/// Value used to decide cache validity without re-reading the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fingerprint {
    /// Archive-sourced or synthetic; always considered current
    Unversioned,
    /// Modification time of the backing file at extraction
    Modified(SystemTime),
}

/// Where a model's text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SourceOrigin {
    File(PathBuf),
    Archive { archive: PathBuf, entry: String },
    /// Unsaved text of the file being edited
    Buffer(PathBuf),
    /// Carved out of the enclosing class's text
    Nested { outer: String },
}

impl SourceOrigin {
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) | Self::Buffer(path) => path.display().to_string(),
            Self::Archive { archive, entry } => format!("{}!{}", archive.display(), entry),
            Self::Nested { outer } => outer.clone(),
        }
    }

    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::File(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: String,
    /// Parameter text with newlines removed and whitespace runs collapsed
    pub params: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassModel {
    /// `Foo` for top-level classes, `Outer$Inner` for nested ones
    pub name: String,
    pub simple_name: String,
    pub origin: SourceOrigin,
    pub fingerprint: Fingerprint,
    pub kind: Option<DeclarationKind>,
    pub access: Option<Visibility>,
    pub type_params: Vec<String>,
    pub superclass: Option<String>,
    /// Recorded for display only; never followed during resolution
    pub interfaces: Vec<String>,
    pub outer_class: Option<String>,
    /// Signature -> parameter text
    pub constructors: BTreeMap<String, String>,
    /// Signature -> method, for instance methods
    pub methods: BTreeMap<String, MethodInfo>,
    pub static_methods: BTreeMap<String, MethodInfo>,
    /// Name -> field, for instance fields
    pub fields: BTreeMap<String, FieldInfo>,
    pub static_fields: BTreeMap<String, FieldInfo>,
    /// Simple name -> nested class
    pub nested: BTreeMap<String, Arc<ClassModel>>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>, origin: SourceOrigin, fingerprint: Fingerprint) -> Self {
        let name = name.into();
        let simple_name = simple_class_name(&name).to_string();
        let outer_class = name.rfind('$').map(|idx| name[..idx].to_string());
        Self {
            name,
            simple_name,
            origin,
            fingerprint,
            kind: None,
            access: None,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            outer_class,
            constructors: BTreeMap::new(),
            methods: BTreeMap::new(),
            static_methods: BTreeMap::new(),
            fields: BTreeMap::new(),
            static_fields: BTreeMap::new(),
            nested: BTreeMap::new(),
        }
    }

    pub fn is_nested(&self) -> bool {
        self.outer_class.is_some()
    }

    pub fn nested_class(&self, simple_name: &str) -> Option<&Arc<ClassModel>> {
        self.nested.get(simple_name)
    }

    /// Top-level class name this model lives in
    pub fn top_level_name(&self) -> &str {
        self.name.split('$').next().unwrap_or(&self.name)
    }

    pub fn member_count(&self) -> usize {
        self.constructors.len()
            + self.methods.len()
            + self.static_methods.len()
            + self.fields.len()
            + self.static_fields.len()
    }
}

/// Last `$`-separated segment of a class name
pub fn simple_class_name(name: &str) -> &str {
    name.rsplit('$').next().unwrap_or(name)
}

/// Whether `name` follows the single-uppercase-letter type parameter convention
pub fn is_type_placeholder(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// A declared type split into its class part, generic arguments, and array depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub base: String,
    pub args: Vec<String>,
    pub array_depth: usize,
}

impl TypeRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let array_depth = raw.matches("[]").count();
        let cleaned: String = raw.replace("[]", "");
        let cleaned = cleaned.trim();

        let (base, args) = match cleaned.find('<') {
            Some(open) => {
                let inner = generic_body(&cleaned[open + 1..]);
                let args = split_top_level(inner, ',')
                    .into_iter()
                    .map(normalize_wildcard)
                    .filter(|arg| !arg.is_empty())
                    .collect();
                (cleaned[..open].trim().to_string(), args)
            }
            None => (cleaned.to_string(), Vec::new()),
        };

        Self {
            base,
            args,
            array_depth,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Class name suitable for lookup: package segments dropped, nested segments
    /// joined with `$` (`java.util.Map.Entry` -> `Map$Entry`)
    pub fn class_name(&self) -> String {
        let segments: Vec<&str> = self.base.split('.').filter(|s| !s.is_empty()).collect();
        let first_type = segments
            .iter()
            .position(|s| s.chars().next().is_some_and(|c| c.is_ascii_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        segments[first_type.min(segments.len())..].join("$")
    }

    /// Argument bound to `placeholder`, using the owner's declared type parameters
    /// when they line up, else the last argument
    pub fn argument_for(&self, placeholder: &str, owner_params: &[String]) -> Option<String> {
        if let Some(idx) = owner_params.iter().position(|p| p == placeholder) {
            if owner_params.len() == self.args.len() {
                return self.args.get(idx).cloned();
            }
        }
        self.args.last().cloned()
    }
}

/// Text between an opening `<` (already consumed) and its matching `>`
fn generic_body(after_open: &str) -> &str {
    let mut depth = 1usize;
    for (idx, ch) in after_open.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return &after_open[..idx];
                }
            }
            _ => {}
        }
    }
    after_open
}

fn normalize_wildcard(arg: String) -> String {
    let arg = arg.trim();
    if arg == "?" {
        return "Object".to_string();
    }
    for prefix in ["? extends ", "? super "] {
        if let Some(rest) = arg.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    arg.to_string()
}

/// Splits on `sep` where it is not nested inside `<>`, `()`, `[]`, or `{}`
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in text.chars() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
        if ch == sep && depth <= 0 {
            parts.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_plain() {
        let ty = TypeRef::parse("int");
        assert_eq!(ty.base, "int");
        assert!(!ty.is_generic());
        assert_eq!(ty.array_depth, 0);
    }

    #[test]
    fn test_type_ref_generic_and_array() {
        let ty = TypeRef::parse("Map<String, List<Integer>>[]");
        assert_eq!(ty.base, "Map");
        assert_eq!(ty.args, vec!["String".to_string(), "List<Integer>".to_string()]);
        assert_eq!(ty.array_depth, 1);
    }

    #[test]
    fn test_type_ref_wildcards() {
        let ty = TypeRef::parse("List<? extends Number>");
        assert_eq!(ty.args, vec!["Number".to_string()]);
        assert_eq!(TypeRef::parse("Class<?>").args, vec!["Object".to_string()]);
    }

    #[test]
    fn test_class_name_drops_package_and_joins_nested() {
        assert_eq!(TypeRef::parse("java.util.Map.Entry<K, V>").class_name(), "Map$Entry");
        assert_eq!(TypeRef::parse("java.util.List").class_name(), "List");
        assert_eq!(TypeRef::parse("Foo").class_name(), "Foo");
        assert_eq!(TypeRef::parse("int").class_name(), "int");
    }

    #[test]
    fn test_argument_for_uses_owner_params() {
        let ty = TypeRef::parse("HashMap<String, Integer>");
        let params = vec!["K".to_string(), "V".to_string()];
        assert_eq!(ty.argument_for("K", &params).as_deref(), Some("String"));
        assert_eq!(ty.argument_for("V", &params).as_deref(), Some("Integer"));
        assert_eq!(ty.argument_for("E", &[]).as_deref(), Some("Integer"));
    }

    #[test]
    fn test_placeholder_convention() {
        assert!(is_type_placeholder("E"));
        assert!(is_type_placeholder("T"));
        assert!(!is_type_placeholder("String"));
        assert!(!is_type_placeholder("e"));
        assert!(!is_type_placeholder(""));
    }

    #[test]
    fn test_nested_model_names() {
        let model = ClassModel::new(
            "Outer$Inner",
            SourceOrigin::Nested { outer: "Outer".into() },
            Fingerprint::Unversioned,
        );
        assert_eq!(model.simple_name, "Inner");
        assert_eq!(model.outer_class.as_deref(), Some("Outer"));
        assert_eq!(model.top_level_name(), "Outer");
        assert!(model.is_nested());
    }

    #[test]
    fn test_model_with_nested_classes_serializes() {
        let mut outer = ClassModel::new("Outer", SourceOrigin::File("Outer.java".into()), Fingerprint::Unversioned);
        let inner = ClassModel::new(
            "Outer$Inner",
            SourceOrigin::Nested { outer: "Outer".into() },
            Fingerprint::Unversioned,
        );
        outer.nested.insert("Inner".to_string(), Arc::new(inner));

        let json = serde_json::to_value(&outer).unwrap();
        assert_eq!(json["nested"]["Inner"]["name"], "Outer$Inner");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("int a, Map<K, V> m, String... rest", ','),
            vec!["int a", "Map<K, V> m", "String... rest"]
        );
        assert!(split_top_level("  ", ',').is_empty());
    }
}
