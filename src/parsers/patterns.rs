//! Compiled declaration patterns
//!
//! Member patterns require an explicit access modifier, which keeps local variable
//! declarations and statements from being mistaken for members.

use once_cell::sync::Lazy;
use regex::Regex;

/// Group `literal` tags string/char literals, group `comment` tags comments. Literals
/// are matched first so comment delimiters inside them are left alone.
pub static COMMENT_OR_LITERAL: Lazy<Regex> = Lazy::new(|| {
    compile(r#"(?P<literal>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*')|(?P<comment>//[^\n]*|/\*(?s:.*?)\*/)"#)
});

/// Access, modifiers, kind, name, and the header tail up to the opening brace
pub static CLASS_HEADER: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?:\b(public|protected|private)\s+)?",
        r"((?:(?:abstract|static|final|sealed|non-sealed|strictfp)\s+)*)",
        r"\b(class|interface|enum|record)\s+",
        r"([A-Za-z_$][\w$]*)",
        r"([^{;]*)\{",
    ))
});

/// Generic or array-suffixed type, e.g. `Map<String, List<Integer>>[]`
const TYPE: &str = r"[A-Za-z_$][\w$.]*(?:\s*<[\w\s,.<>?&\[\]$]*>)?(?:\s*\[\s*\])*";

/// Access, modifiers, return type, name, raw parameters
pub static METHOD: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        concat!(
            r"(?:\b(public|protected|private|default)\s+)",
            r"((?:(?:abstract|static|final|synchronized|native|strictfp|default)\s+)*)",
            r"(?:<[\w\s,.<>?&\[\]$]*>\s+)?",
            r"({ty})\s+",
            r"([A-Za-z_$][\w$]*)\s*",
            r"\(\s*([^)]*?)\s*\)",
        ),
        ty = TYPE
    ))
});

/// Access, modifiers, type, declarator list (names with optional initializers)
pub static FIELD: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        concat!(
            r"(?:\b(public|protected|private)\s+)",
            r"((?:(?:transient|volatile|static|final)\s+)*)",
            r"({ty})\s+",
            r"([A-Za-z_$][\w$]*[^;]*);",
        ),
        ty = TYPE
    ))
});

/// Leading identifier of a declarator such as `count = 0`
pub static DECLARATOR_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^\s*([A-Za-z_$][\w$]*)"));

/// Runs of whitespace inside parameter lists
pub static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| compile(r"\s\s+"));

/// `<access> <ClassName>(<params>)` for one class
pub fn constructor_pattern(class_name: &str) -> Regex {
    compile(&format!(
        r"(?:\b(public|protected|private)\s+)({})\s*\(\s*([^)]*?)\s*\)",
        regex::escape(class_name)
    ))
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants plus an escaped identifier; a failure here is a
    // programming error caught by the unit tests below.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid declaration pattern {pattern}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        Lazy::force(&COMMENT_OR_LITERAL);
        Lazy::force(&CLASS_HEADER);
        Lazy::force(&METHOD);
        Lazy::force(&FIELD);
        Lazy::force(&DECLARATOR_NAME);
        Lazy::force(&WHITESPACE_RUN);
        constructor_pattern("Foo$Bar");
    }

    #[test]
    fn test_class_header_groups() {
        let caps = CLASS_HEADER
            .captures("public abstract class Foo<T> extends Bar implements Baz, Qux {")
            .unwrap();
        assert_eq!(&caps[1], "public");
        assert_eq!(caps[2].trim(), "abstract");
        assert_eq!(&caps[3], "class");
        assert_eq!(&caps[4], "Foo");
        assert_eq!(caps[5].trim(), "<T> extends Bar implements Baz, Qux");
    }

    #[test]
    fn test_method_groups() {
        let caps = METHOD
            .captures("public static <T> Map<String, List<T>> group(List<T> items,\n   int size) {")
            .unwrap();
        assert_eq!(&caps[1], "public");
        assert_eq!(caps[2].trim(), "static");
        assert_eq!(&caps[3], "Map<String, List<T>>");
        assert_eq!(&caps[4], "group");
        assert_eq!(&caps[5], "List<T> items,\n   int size");
    }

    #[test]
    fn test_field_groups() {
        let caps = FIELD.captures("private final int count, total = 0;").unwrap();
        assert_eq!(&caps[1], "private");
        assert_eq!(caps[2].trim(), "final");
        assert_eq!(&caps[3], "int");
        assert_eq!(&caps[4], "count, total = 0");
    }

    #[test]
    fn test_comment_pattern_skips_literals() {
        let text = r#"String s = "// not a comment"; // real"#;
        let tagged: Vec<(bool, &str)> = COMMENT_OR_LITERAL
            .captures_iter(text)
            .map(|c| (c.name("comment").is_some(), c.get(0).unwrap().as_str()))
            .collect();
        assert_eq!(tagged, vec![(false, "\"// not a comment\""), (true, "// real")]);
    }
}
