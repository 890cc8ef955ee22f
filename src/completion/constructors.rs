//! Constructor completion after `new Type(`

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ScanLimits;
use crate::models::TypeRef;
use crate::text::{find_opening, DelimiterPair};

static NEW_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bnew\s+([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)\s*$")
        .unwrap_or_else(|e| panic!("invalid constructor trigger pattern: {e}"))
});

/// Class name being constructed when `line_prefix` ends in `new Type(` or
/// `new Type<Args>(`
///
/// Qualified names come back in lookup form (`java.util.Map.Entry` -> `Map$Entry`).
pub fn constructor_target(line_prefix: &str, limits: &ScanLimits) -> Option<String> {
    let before_paren = line_prefix.trim_end().strip_suffix('(')?.trim_end();

    let without_generics = if before_paren.ends_with('>') {
        let close = before_paren.len() - 1;
        let open = find_opening(before_paren, Some(close), DelimiterPair::ANGLES, limits)?;
        &before_paren[..open]
    } else {
        before_paren
    };

    let caps = NEW_TYPE.captures(without_generics)?;
    let written: String = caps.get(1)?.as_str().chars().filter(|c| !c.is_whitespace()).collect();
    Some(TypeRef::parse(&written).class_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(text: &str) -> Option<String> {
        constructor_target(text, &ScanLimits::default())
    }

    #[test]
    fn test_plain_and_generic_constructors() {
        assert_eq!(target("Foo f = new Foo(").as_deref(), Some("Foo"));
        assert_eq!(target("list = new ArrayList<Map<String, Integer>>(").as_deref(), Some("ArrayList"));
        assert_eq!(target("x = new HashMap<>(").as_deref(), Some("HashMap"));
    }

    #[test]
    fn test_qualified_constructor() {
        assert_eq!(target("new java.util.ArrayList(").as_deref(), Some("ArrayList"));
        assert_eq!(target("new Outer.Inner(").as_deref(), Some("Outer$Inner"));
    }

    #[test]
    fn test_non_constructor_calls() {
        assert_eq!(target("foo.bar("), None);
        assert_eq!(target("renew Foo("), None);
        assert_eq!(target("new Foo"), None);
        assert_eq!(target("new Foo<String("), None);
    }
}
