//! Class model extraction
//!
//! Turns raw source text into a [`ClassModel`] without a grammar. The text is first
//! masked (comments blanked, literal contents blanked) so byte offsets never shift, then
//! consumed pass by pass: nested classes, the outer header, constructors, methods, and
//! finally fields. Every construct a pass consumes is claimed, which blanks its byte
//! range so later passes cannot see it again.

use std::ops::Range;
use std::sync::Arc;

use regex::Captures;
use tracing::{debug, trace};

use super::lexer::{is_keyword, is_primitive_type};
use super::patterns::{
    constructor_pattern, CLASS_HEADER, COMMENT_OR_LITERAL, DECLARATOR_NAME, FIELD, METHOD,
    WHITESPACE_RUN,
};
use crate::config::ScanLimits;
use crate::models::{
    split_top_level, ClassModel, DeclarationKind, FieldInfo, Fingerprint, MethodInfo,
    SourceOrigin, Visibility,
};
use crate::text::{find_closing, DelimiterPair};

/// Working copy of a compilation unit with the set of ranges already consumed
struct ClaimedText {
    text: String,
    claimed: Vec<Range<usize>>,
}

impl ClaimedText {
    fn new(text: String) -> Self {
        Self {
            text,
            claimed: Vec::new(),
        }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn is_claimed(&self, pos: usize) -> bool {
        self.claimed.iter().any(|range| range.contains(&pos))
    }

    /// Marks `range` as consumed. Offsets outside it are unaffected.
    fn claim(&mut self, range: Range<usize>) {
        let end = range.end.min(self.text.len());
        let start = range.start.min(end);
        if start == end {
            return;
        }
        let blank = " ".repeat(end - start);
        self.text.replace_range(start..end, &blank);
        self.claimed.push(start..end);
    }
}

/// Blanks comments and the contents of string/char literals, preserving every offset
pub fn mask_comments_and_literals(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for caps in COMMENT_OR_LITERAL.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&raw[last..whole.start()]);
        let span = whole.as_str();
        if caps.name("comment").is_some() {
            // Byte-wise so multi-byte characters keep their width
            out.extend(span.bytes().map(|b| if b == b'\n' { '\n' } else { ' ' }));
        } else {
            let quote = &span[..1];
            out.push_str(quote);
            if span.len() >= 2 && span.ends_with(quote) {
                out.extend(std::iter::repeat(' ').take(span.len() - 2));
                out.push_str(quote);
            } else {
                out.extend(std::iter::repeat(' ').take(span.len() - 1));
            }
        }
        last = whole.end();
    }
    out.push_str(&raw[last..]);
    out
}

/// Collapses a raw parameter list onto one line
pub fn normalize_params(raw: &str) -> String {
    let single_line = raw.replace(['\n', '\r'], "");
    WHITESPACE_RUN.replace_all(single_line.trim(), " ").into_owned()
}

/// Extracts class models from source text
#[derive(Debug, Clone, Copy)]
pub struct ClassExtractor {
    limits: ScanLimits,
}

impl ClassExtractor {
    pub fn new(limits: ScanLimits) -> Self {
        Self { limits }
    }

    /// Builds the model for the compilation unit `raw`, named `name`
    ///
    /// Never fails: text that matches no declaration yields empty collections.
    pub fn extract(
        &self,
        name: &str,
        origin: SourceOrigin,
        fingerprint: Fingerprint,
        raw: &str,
    ) -> ClassModel {
        let masked = mask_comments_and_literals(raw);
        let model = self.extract_masked(name, origin, fingerprint, masked);
        debug!(
            "Extracted {} ({} members, {} nested)",
            model.name,
            model.member_count(),
            model.nested.len()
        );
        model
    }

    fn extract_masked(
        &self,
        name: &str,
        origin: SourceOrigin,
        fingerprint: Fingerprint,
        masked: String,
    ) -> ClassModel {
        let mut model = ClassModel::new(name, origin, fingerprint);
        let mut text = ClaimedText::new(masked);

        self.extract_nested(&mut model, &mut text);
        let body_start = self.parse_header(&mut model, &mut text);
        self.parse_constructors(&mut model, &mut text);
        self.parse_methods(&mut model, &mut text);
        self.parse_fields(&mut model, &text);
        if let (Some(DeclarationKind::Enum), Some(start)) = (model.kind, body_start) {
            self.parse_enum_constants(&mut model, &text.as_str()[start..]);
        }

        model
    }

    /// Carves out every class declared after the outermost one
    fn extract_nested(&self, model: &mut ClassModel, text: &mut ClaimedText) {
        let headers: Vec<(usize, usize, String)> = CLASS_HEADER
            .captures_iter(text.as_str())
            .skip(1)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end() - 1, caps.get(4)?.as_str().to_string()))
            })
            .collect();

        for (start, brace, inner_name) in headers {
            if text.is_claimed(start) {
                continue;
            }
            let Some(close) = find_closing(text.as_str(), Some(brace), DelimiterPair::BRACES, &self.limits)
            else {
                trace!("No closing brace for nested class {} in {}", inner_name, model.name);
                continue;
            };

            let body = text.as_str()[start..=close].to_string();
            let nested_name = format!("{}${}", model.name, inner_name);
            let nested = self.extract_masked(
                &nested_name,
                SourceOrigin::Nested {
                    outer: model.name.clone(),
                },
                model.fingerprint,
                body,
            );
            model.nested.insert(inner_name, Arc::new(nested));
            text.claim(start..close + 1);
        }
    }

    /// Returns the offset just past the opening brace of the class body
    fn parse_header(&self, model: &mut ClassModel, text: &mut ClaimedText) -> Option<usize> {
        let Some(caps) = CLASS_HEADER.captures(text.as_str()) else {
            trace!("No class header in {}", model.name);
            return None;
        };
        let whole = caps.get(0)?;
        let span = whole.range();

        model.access = caps.get(1).and_then(|m| Visibility::parse(m.as_str()));
        model.kind = caps.get(3).and_then(|m| DeclarationKind::parse(m.as_str()));
        let tail = caps.get(5).map(|m| m.as_str()).unwrap_or_default();
        let header = HeaderTail::parse(tail, model.kind);
        model.type_params = header.type_params;
        model.superclass = header.superclass;
        model.interfaces = header.interfaces;

        let body_start = span.end;
        text.claim(span);
        Some(body_start)
    }

    fn parse_constructors(&self, model: &mut ClassModel, text: &mut ClaimedText) {
        let pattern = constructor_pattern(&model.simple_name);
        let mut cursor = 0;
        while let Some(caps) = pattern.captures_at(text.as_str(), cursor) {
            let Some(whole) = caps.get(0) else { break };
            let span = whole.range();
            let params = normalize_params(caps.get(3).map_or("", |m| m.as_str()));
            let signature = format!("{}({})", model.simple_name, params);
            model.constructors.insert(signature, params);

            cursor = self.consume_body(text, span, false);
        }
    }

    fn parse_methods(&self, model: &mut ClassModel, text: &mut ClaimedText) {
        let mut cursor = 0;
        while let Some(caps) = METHOD.captures_at(text.as_str(), cursor) {
            let Some(whole) = caps.get(0) else { break };
            let span = whole.range();
            let modifiers = caps.get(2).map_or("", |m| m.as_str());
            let is_abstract = has_word(modifiers, "abstract");

            if let Some((signature, method, is_static)) = method_from_captures(&caps) {
                if is_static {
                    model.static_methods.insert(signature, method);
                } else {
                    model.methods.insert(signature, method);
                }
            }

            cursor = self.consume_body(text, span, is_abstract);
        }
    }

    /// Claims a member header and its body (or trailing `;`), returning where the next
    /// search starts. Always moves past the header.
    fn consume_body(&self, text: &mut ClaimedText, header: Range<usize>, is_abstract: bool) -> usize {
        let rest = &text.as_str()[header.end..];
        let next_brace = rest.find('{').map(|i| header.end + i);
        let next_semi = rest.find(';').map(|i| header.end + i);

        let end = match (next_brace, next_semi) {
            (_, Some(semi)) if is_abstract => Some(semi + 1),
            (Some(brace), Some(semi)) if semi < brace => Some(semi + 1),
            (Some(brace), _) => {
                find_closing(text.as_str(), Some(brace), DelimiterPair::BRACES, &self.limits).map(|close| close + 1)
            }
            (None, Some(semi)) => Some(semi + 1),
            (None, None) => None,
        };

        let end = end.unwrap_or(header.end);
        text.claim(header.start..end);
        end.max(header.end)
    }

    fn parse_fields(&self, model: &mut ClassModel, text: &ClaimedText) {
        for caps in FIELD.captures_iter(text.as_str()) {
            let Some(visibility) = caps.get(1).and_then(|m| Visibility::parse(m.as_str())) else {
                continue;
            };
            let modifiers = caps.get(2).map_or("", |m| m.as_str());
            let type_name = caps.get(3).map_or("", |m| m.as_str()).trim();
            if is_keyword(type_name) && !is_primitive_type(type_name) {
                continue;
            }
            let type_name = collapse_type(type_name);
            let is_static = has_word(modifiers, "static");
            let declarators = caps.get(4).map_or("", |m| m.as_str());

            for declarator in split_top_level(declarators, ',') {
                let Some(name) = DECLARATOR_NAME
                    .captures(&declarator)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                else {
                    continue;
                };
                if is_keyword(&name) {
                    continue;
                }
                let field = FieldInfo {
                    name: name.clone(),
                    type_name: type_name.clone(),
                    visibility,
                };
                if is_static {
                    model.static_fields.insert(name, field);
                } else {
                    model.fields.insert(name, field);
                }
            }
        }
    }

    /// Enum constants are the identifiers before the first `;` of the body
    fn parse_enum_constants(&self, model: &mut ClassModel, body: &str) {
        let end = body.find(';').or_else(|| body.rfind('}')).unwrap_or(body.len());
        for item in split_top_level(&body[..end], ',') {
            let Some(name) = DECLARATOR_NAME.captures(&item).and_then(|c| c.get(1)) else {
                continue;
            };
            let name = name.as_str();
            if is_keyword(name) || !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                continue;
            }
            model.static_fields.insert(
                name.to_string(),
                FieldInfo {
                    name: name.to_string(),
                    type_name: model.simple_name.clone(),
                    visibility: Visibility::Public,
                },
            );
        }
    }
}

impl Default for ClassExtractor {
    fn default() -> Self {
        Self::new(ScanLimits::default())
    }
}

fn method_from_captures(caps: &Captures<'_>) -> Option<(String, MethodInfo, bool)> {
    let visibility = Visibility::parse(caps.get(1)?.as_str())?;
    let modifiers = caps.get(2).map_or("", |m| m.as_str());
    let return_type = caps.get(3)?.as_str().trim();
    let name = caps.get(4)?.as_str();
    if is_keyword(name) || (is_keyword(return_type) && !is_primitive_type(return_type)) {
        return None;
    }

    let params = normalize_params(caps.get(5).map_or("", |m| m.as_str()));
    let signature = format!("{}({})", name, params);
    let method = MethodInfo {
        name: name.to_string(),
        return_type: collapse_type(return_type),
        params,
        visibility,
    };
    Some((signature, method, has_word(modifiers, "static")))
}

fn has_word(text: &str, word: &str) -> bool {
    text.split_whitespace().any(|w| w == word)
}

fn collapse_type(raw: &str) -> String {
    normalize_params(raw).replace(" [", "[").replace("[ ]", "[]")
}

/// Type parameters, superclass and interfaces from the text between a class name and
/// its opening brace
#[derive(Debug, Default, PartialEq, Eq)]
struct HeaderTail {
    type_params: Vec<String>,
    superclass: Option<String>,
    interfaces: Vec<String>,
}

impl HeaderTail {
    fn parse(tail: &str, kind: Option<DeclarationKind>) -> Self {
        let mut header = Self::default();
        let mut rest = tail.trim();

        if rest.starts_with('<') {
            // An unclosed list takes the rest of the header
            let (params, after) = match matching_angle(rest) {
                Some(close) => (&rest[1..close], rest[close + 1..].trim_start()),
                None => (&rest[1..], ""),
            };
            header.type_params = split_top_level(params, ',')
                .iter()
                .filter_map(|p| p.split_whitespace().next().map(str::to_string))
                .collect();
            rest = after;
        }

        // Record components
        if rest.starts_with('(') {
            rest = rest.find(')').map_or("", |idx| rest[idx + 1..].trim_start());
        }

        let (extends_part, implements_part) = split_clauses(rest);
        let extended: Vec<String> = extends_part
            .map(|list| split_top_level(list, ',').iter().map(|t| strip_generics(t)).collect())
            .unwrap_or_default();
        let implemented: Vec<String> = implements_part
            .map(|list| split_top_level(list, ',').iter().map(|t| strip_generics(t)).collect())
            .unwrap_or_default();

        let mut extended = extended.into_iter().filter(|t| !t.is_empty());
        header.superclass = extended.next();
        if kind == Some(DeclarationKind::Interface) {
            header.interfaces.extend(extended);
        }
        header.interfaces.extend(implemented.into_iter().filter(|t| !t.is_empty()));
        header
    }
}

fn matching_angle(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn split_clauses(rest: &str) -> (Option<&str>, Option<&str>) {
    let keyword_at = |kw: &str| {
        rest.match_indices(kw).map(|(idx, _)| idx).find(|&idx| {
            let before_ok = idx == 0 || rest.as_bytes()[idx - 1].is_ascii_whitespace();
            let after = idx + kw.len();
            let after_ok = after >= rest.len() || rest.as_bytes()[after].is_ascii_whitespace();
            before_ok && after_ok
        })
    };
    let extends = keyword_at("extends");
    let implements = keyword_at("implements");
    let permits = keyword_at("permits");

    let section = |start: Option<usize>, kw: &str| {
        start.map(|s| {
            let body_start = s + kw.len();
            let body_end = [extends, implements, permits]
                .into_iter()
                .flatten()
                .filter(|&other| other > s)
                .min()
                .unwrap_or(rest.len());
            rest[body_start..body_end].trim()
        })
    };
    (section(extends, "extends"), section(implements, "implements"))
}

fn strip_generics(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name).trim();
    base.rsplit('.').next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn extract(name: &str, source: &str) -> ClassModel {
        ClassExtractor::default().extract(
            name,
            SourceOrigin::File(format!("/tmp/{name}.java").into()),
            Fingerprint::Unversioned,
            source,
        )
    }

    const SAMPLE: &str = indoc! {r#"
        package com.example;

        import java.util.List;

        /** A sample { with braces in docs */
        public class Sample extends Base implements Runnable, Comparable<Sample> {
            public static final int MAX = 10, MIN = 0;
            private final int count;
            protected List<String> names = new ArrayList<>();
            public String label = "} tricky {";

            public Sample(int count,
                          String label) {
                this.count = count;
            }

            public int getCount() {
                if (count > 0) { return count; }
                return 0;
            }

            public static List<String> names() {
                return null;
            }

            // public void commented() {}
            public abstract void run();

            public static class Builder {
                private int size;
                public Builder size(int size) { this.size = size; return this; }
                public Sample build() { return null; }
            }
        }
    "#};

    #[test]
    fn test_header() {
        let model = extract("Sample", SAMPLE);
        assert_eq!(model.access, Some(Visibility::Public));
        assert_eq!(model.kind, Some(DeclarationKind::Class));
        assert_eq!(model.superclass.as_deref(), Some("Base"));
        assert_eq!(model.interfaces, vec!["Runnable".to_string(), "Comparable".to_string()]);
    }

    #[test]
    fn test_fields_are_classified() {
        let model = extract("Sample", SAMPLE);
        let count = model.fields.get("count").expect("count should be an instance field");
        assert_eq!(count.type_name, "int");
        assert_eq!(count.visibility, Visibility::Private);
        assert!(!model.static_fields.contains_key("count"));

        assert_eq!(model.static_fields["MAX"].type_name, "int");
        assert_eq!(model.static_fields["MIN"].type_name, "int");
        assert_eq!(model.fields["names"].type_name, "List<String>");
        assert!(model.fields.contains_key("label"));
    }

    #[test]
    fn test_constructors_and_methods() {
        let model = extract("Sample", SAMPLE);
        assert_eq!(
            model.constructors.get("Sample(int count, String label)").map(String::as_str),
            Some("int count, String label")
        );
        assert_eq!(model.methods["getCount()"].return_type, "int");
        assert_eq!(model.static_methods["names()"].return_type, "List<String>");
        assert!(model.methods.contains_key("run()"));
        assert!(!model.methods.keys().any(|k| k.starts_with("commented")));
    }

    #[test]
    fn test_nested_class_is_owned_and_hidden_from_outer() {
        let model = extract("Sample", SAMPLE);
        let builder = model.nested_class("Builder").expect("nested Builder");
        assert_eq!(builder.name, "Sample$Builder");
        assert_eq!(builder.outer_class.as_deref(), Some("Sample"));
        assert_eq!(builder.methods["size(int size)"].return_type, "Builder");
        assert!(builder.fields.contains_key("size"));
        assert!(!model.methods.contains_key("build()"));
        assert!(!model.fields.contains_key("size"));
    }

    #[test]
    fn test_deeply_nested_classes() {
        let source = indoc! {r#"
            public class A {
                public class B {
                    public class C {
                        public int depth() { return 3; }
                    }
                    public int b() { return 2; }
                }
                public int a() { return 1; }
            }
        "#};
        let model = extract("A", source);
        let b = model.nested_class("B").unwrap();
        let c = b.nested_class("C").unwrap();
        assert_eq!(c.name, "A$B$C");
        assert!(c.methods.contains_key("depth()"));
        assert!(b.methods.contains_key("b()"));
        assert!(!b.methods.contains_key("depth()"));
        assert!(model.methods.contains_key("a()"));
        assert_eq!(model.methods.len(), 1);
    }

    #[test]
    fn test_determinism_and_comment_insensitivity() {
        let first = extract("Sample", SAMPLE);
        let second = extract("Sample", SAMPLE);
        assert_eq!(first, second);

        let edited = SAMPLE.replace("// public void commented() {}", "/* a different { comment */");
        let third = extract("Sample", &edited);
        assert_eq!(first.methods, third.methods);
        assert_eq!(first.fields, third.fields);
        assert_eq!(first.static_methods, third.static_methods);
    }

    #[test]
    fn test_interface_methods_without_bodies() {
        let source = indoc! {r#"
            public interface Shape extends Comparable<Shape>, Cloneable {
                public double area();
                default String describe() { return "shape"; }
                public static Shape unit() { return null; }
            }
        "#};
        let model = extract("Shape", source);
        assert_eq!(model.kind, Some(DeclarationKind::Interface));
        assert_eq!(model.superclass.as_deref(), Some("Comparable"));
        assert_eq!(model.interfaces, vec!["Cloneable".to_string()]);
        assert_eq!(model.methods["area()"].return_type, "double");
        assert_eq!(model.methods["describe()"].return_type, "String");
        assert!(model.static_methods.contains_key("unit()"));
    }

    #[test]
    fn test_generic_class_header() {
        let source = "public class Box<K extends Comparable<K>, V> extends AbstractMap<K, V> { }";
        let model = extract("Box", source);
        assert_eq!(model.type_params, vec!["K".to_string(), "V".to_string()]);
        assert_eq!(model.superclass.as_deref(), Some("AbstractMap"));
    }

    #[test]
    fn test_unclosed_type_parameters_while_typing() {
        let model = extract("Box", "public class Box< {}");
        assert_eq!(model.kind, Some(DeclarationKind::Class));
        assert!(model.type_params.is_empty());

        let model = extract("Box", "public class Box<Ä {}");
        assert_eq!(model.type_params, vec!["Ä".to_string()]);

        let model = extract("Box", "public class Box<K, V extends Base { public int size() { return 0; } }");
        assert_eq!(model.type_params, vec!["K".to_string(), "V".to_string()]);
        assert!(model.superclass.is_none());
        assert!(model.methods.contains_key("size()"));

        assert_eq!(HeaderTail::parse("<", Some(DeclarationKind::Class)), HeaderTail::default());
    }

    #[test]
    fn test_enum_constants() {
        let source = indoc! {r#"
            public enum Color {
                RED, GREEN("g"), BLUE;
                public String code() { return ""; }
            }
        "#};
        let model = extract("Color", source);
        for name in ["RED", "GREEN", "BLUE"] {
            assert_eq!(model.static_fields[name].type_name, "Color");
        }
        assert!(model.methods.contains_key("code()"));
    }

    #[test]
    fn test_malformed_input_degrades() {
        let model = extract("Broken", "public class Broken { public int x( { public void y() {");
        assert_eq!(model.kind, Some(DeclarationKind::Class));
        let empty = extract("Empty", "");
        assert_eq!(empty.member_count(), 0);
        assert!(empty.kind.is_none());
    }

    #[test]
    fn test_mask_preserves_offsets() {
        let raw = "int a; // é comment\nString s = \"/* é */\"; /* x\ny */ int b;";
        let masked = mask_comments_and_literals(raw);
        assert_eq!(masked.len(), raw.len());
        assert_eq!(masked.find("int b"), raw.find("int b"));
        assert!(!masked.contains("comment"));
        let blank_literal = format!("\"{}\"", " ".repeat("/* é */".len()));
        assert!(masked.contains(&blank_literal));
        assert_eq!(masked.matches('\n').count(), 2);
    }

    #[test]
    fn test_normalize_params() {
        assert_eq!(normalize_params("int a,\n      String   b"), "int a, String b");
        assert_eq!(normalize_params(""), "");
    }
}
