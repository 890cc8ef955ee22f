//! Member-chain resolution
//!
//! Walks an [`AccessChain`] from its root to its last hop, producing the class whose
//! members should be offered and whether only static members are visible there.
//!
//! Roots resolve in this order: `super`/`this`, a local declaration found by scanning
//! backward from the cursor, a member of the class being edited, and finally a class
//! name (static context). Each hop searches instance methods, static methods, instance
//! fields, static fields and nested classes of the current class, then its superclass
//! chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::chain::AccessChain;
use crate::config::ScanLimits;
use crate::index::ClassRepository;
use crate::models::{is_type_placeholder, ClassModel, MethodInfo, TypeRef, Visibility};
use crate::parsers::lexer::{classify, tokenize, Token, TokenKind};
use crate::text::{find_closing, find_opening, DelimiterPair};

/// Target class of a chain plus the static/instance context at its end
#[derive(Debug, Clone, Default)]
pub struct ResolvedReference {
    pub class: Option<Arc<ClassModel>>,
    pub static_only: bool,
}

impl ResolvedReference {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self) -> bool {
        self.class.is_some()
    }
}

/// One resolved link of the chain
#[derive(Debug, Clone)]
struct Step {
    model: Arc<ClassModel>,
    /// Type as declared at the link, generics included
    declared: TypeRef,
    static_only: bool,
}

enum MemberMatch<'m> {
    Typed(&'m str),
    Nested(Arc<ClassModel>),
}

pub struct ChainResolver<'a> {
    repository: &'a mut ClassRepository,
    editing: Option<&'a ClassModel>,
    limits: ScanLimits,
}

impl<'a> ChainResolver<'a> {
    pub fn new(repository: &'a mut ClassRepository, editing: Option<&'a ClassModel>, limits: ScanLimits) -> Self {
        Self {
            repository,
            editing,
            limits,
        }
    }

    /// Resolves `chain`, using `preceding` (text before the cursor) for local
    /// declarations
    pub fn resolve(&mut self, chain: &AccessChain, preceding: &str) -> ResolvedReference {
        let Some(mut step) = self.resolve_root(&chain.root, preceding) else {
            debug!("Unresolved root {:?}", chain.root);
            return ResolvedReference::unresolved();
        };

        for hop in &chain.hops {
            match self.resolve_hop(&step, hop) {
                Some(next) => step = next,
                None => {
                    debug!("Unresolved hop {:?} on {}", hop, step.model.name);
                    return ResolvedReference::unresolved();
                }
            }
        }

        trace!("Resolved chain to {} (static: {})", step.model.name, step.static_only);
        ResolvedReference {
            class: Some(step.model),
            static_only: step.static_only,
        }
    }

    fn resolve_root(&mut self, root: &str, preceding: &str) -> Option<Step> {
        match root {
            "super" => {
                let superclass = self.editing?.superclass.as_deref()?;
                return self.instance_step(TypeRef::parse(superclass));
            }
            "this" => {
                let editing = self.editing?;
                return Some(Step {
                    model: Arc::new(editing.clone()),
                    declared: TypeRef::parse(&editing.simple_name),
                    static_only: false,
                });
            }
            _ => {}
        }

        if let Some(type_text) = find_local_declaration(preceding, root, &self.limits) {
            trace!("Local declaration {} {}", type_text, root);
            return self.instance_step(TypeRef::parse(&type_text));
        }

        if let Some(editing) = self.editing {
            let own = Arc::new(editing.clone());
            if let Some(step) = self.find_member(own, root, None) {
                return Some(step);
            }
        }

        let declared = TypeRef::parse(root);
        let model = self.class_for(&declared)?;
        Some(Step {
            model,
            declared,
            static_only: true,
        })
    }

    fn resolve_hop(&mut self, current: &Step, hop: &str) -> Option<Step> {
        let previous = current.declared.clone();
        self.find_member(current.model.clone(), hop, Some(&previous))
    }

    /// Searches `start` and its ancestors for `name`
    fn find_member(&mut self, start: Arc<ClassModel>, name: &str, previous: Option<&TypeRef>) -> Option<Step> {
        let context_params = start.type_params.clone();
        let mut visited = FxHashSet::default();
        let mut current = start;

        loop {
            if !visited.insert(current.name.clone()) {
                debug!("Inheritance cycle at {}", current.name);
                return None;
            }
            if !self.is_accessible(&current) {
                debug!("{} is private to its own file", current.name);
                return None;
            }

            match lookup_member(&current, name) {
                Some(MemberMatch::Typed(type_text)) => {
                    let declared = bind_placeholders(TypeRef::parse(type_text), previous, &context_params);
                    let model = self.class_for_member(&current, &declared)?;
                    return Some(Step {
                        model,
                        declared,
                        static_only: false,
                    });
                }
                Some(MemberMatch::Nested(model)) => {
                    if !self.is_accessible(&model) {
                        debug!("{} is private to its own file", model.name);
                        return None;
                    }
                    let declared = TypeRef::parse(&model.name);
                    return Some(Step {
                        model,
                        declared,
                        static_only: true,
                    });
                }
                None => {}
            }

            let superclass = current.superclass.clone()?;
            current = self.class_for(&TypeRef::parse(&superclass))?;
        }
    }

    fn instance_step(&mut self, declared: TypeRef) -> Option<Step> {
        let model = self.class_for(&declared)?;
        Some(Step {
            model,
            declared,
            static_only: false,
        })
    }

    fn class_for(&mut self, declared: &TypeRef) -> Option<Arc<ClassModel>> {
        let name = declared.class_name();
        match self.repository.resolve_class(&name, self.editing) {
            Ok(model) => Some(model),
            Err(e) => {
                debug!("Cannot resolve {}: {}", name, e);
                None
            }
        }
    }

    /// Like [`Self::class_for`], but also finds nested classes visible from `owner`
    /// (`Foo$Builder.named` returning `Builder`)
    fn class_for_member(&mut self, owner: &ClassModel, declared: &TypeRef) -> Option<Arc<ClassModel>> {
        if let Some(model) = self.class_for(declared) {
            return Some(model);
        }
        let name = declared.class_name();
        if let Some(nested) = owner.nested_class(&name) {
            return Some(nested.clone());
        }
        let scoped = format!("{}${}", owner.top_level_name(), name);
        self.repository.resolve_class(&scoped, self.editing).ok()
    }

    fn is_accessible(&self, model: &ClassModel) -> bool {
        model.access != Some(Visibility::Private)
            || self.editing.is_some_and(|editing| is_relative(model, editing))
    }
}

/// Whether two models share a top-level class (same class, nested, or outer)
pub fn is_relative(model: &ClassModel, editing: &ClassModel) -> bool {
    model.top_level_name() == editing.top_level_name()
}

fn lookup_member<'m>(model: &'m ClassModel, name: &str) -> Option<MemberMatch<'m>> {
    let call = format!("{}(", name);
    let by_signature = |methods: &'m BTreeMap<String, MethodInfo>| {
        let mut candidates = methods.iter().filter(|(signature, _)| signature.contains(&call));
        let first = candidates.clone().next();
        candidates
            .find(|(_, method)| method.name == name)
            .or(first)
            .map(|(_, method)| method.return_type.as_str())
    };

    by_signature(&model.methods)
        .or_else(|| by_signature(&model.static_methods))
        .or_else(|| model.fields.get(name).map(|field| field.type_name.as_str()))
        .or_else(|| model.static_fields.get(name).map(|field| field.type_name.as_str()))
        .map(MemberMatch::Typed)
        .or_else(|| model.nested_class(name).cloned().map(MemberMatch::Nested))
}

/// Replaces single-letter type parameters with the arguments captured at the
/// previous link (`List<String>` then `get` returning `E` gives `String`)
fn bind_placeholders(declared: TypeRef, previous: Option<&TypeRef>, owner_params: &[String]) -> TypeRef {
    let Some(previous) = previous.filter(|p| p.is_generic()) else {
        return declared;
    };
    let bind = |name: &str| {
        is_type_placeholder(name)
            .then(|| previous.argument_for(name, owner_params))
            .flatten()
    };

    if let Some(argument) = bind(&declared.base) {
        let mut bound = TypeRef::parse(&argument);
        bound.array_depth += declared.array_depth;
        return bound;
    }
    let args = declared
        .args
        .iter()
        .map(|arg| bind(arg).unwrap_or_else(|| arg.clone()))
        .collect();
    TypeRef { args, ..declared }
}

/// Finds the declared type of the nearest declaration of `name` in `window`
///
/// Recognizes `Type name`, `Type<Args> name`, `Type[] name`, `Type... name`, and
/// `name = new Type(...)`. A constructed type wins over the declared one, but keeps
/// the declared generic arguments when it uses a diamond.
pub fn find_local_declaration(window: &str, name: &str, limits: &ScanLimits) -> Option<String> {
    let tokens: Vec<Token> = tokenize(window).into_iter().filter(|t| !t.is_trivia()).collect();

    for idx in (0..tokens.len()).rev() {
        let token = &tokens[idx];
        if token.kind != TokenKind::Identifier || token.text(window) != name {
            continue;
        }
        // `obj.name` is a member access, `Type... name` is not
        let member_access = idx > 0
            && tokens[idx - 1].is_punct('.')
            && !(idx > 1 && tokens[idx - 2].is_punct('.'));
        if member_access {
            continue;
        }

        let constructed = constructed_type_after(&tokens, idx, window, limits);
        let declared = declared_type_before(&tokens, idx, window, limits);
        let found = match (constructed, declared) {
            (Some(constructed), Some(declared)) => Some(merge_generics(&constructed, &declared)),
            (Some(constructed), None) => Some(constructed),
            (None, Some(declared)) => Some(declared),
            (None, None) => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn constructed_type_after(tokens: &[Token], idx: usize, window: &str, limits: &ScanLimits) -> Option<String> {
    let is_assignment = tokens.get(idx + 1)?.is_punct('=');
    let new_keyword = tokens.get(idx + 2)?;
    if !is_assignment || new_keyword.kind != TokenKind::Keyword || new_keyword.text(window) != "new" {
        return None;
    }

    let first = tokens.get(idx + 3).filter(|t| t.kind == TokenKind::Identifier)?;
    let mut last = idx + 3;
    while tokens.get(last + 1).is_some_and(|t| t.is_punct('.'))
        && tokens.get(last + 2).is_some_and(|t| t.kind == TokenKind::Identifier)
    {
        last += 2;
    }

    let mut end = tokens[last].end;
    if let Some(open) = tokens.get(last + 1).filter(|t| t.is_punct('<')) {
        end = find_closing(window, Some(open.start), DelimiterPair::ANGLES, limits)? + 1;
    }
    Some(window[first.start..end].to_string())
}

fn declared_type_before(tokens: &[Token], idx: usize, window: &str, limits: &ScanLimits) -> Option<String> {
    let type_end = tokens[idx.checked_sub(1)?].end;
    let mut j = idx.checked_sub(1)?;

    // `Type... name`
    let mut dots = 0;
    while dots < 3 && tokens[j].is_punct('.') {
        j = j.checked_sub(1)?;
        dots += 1;
    }
    // `Type[] name`
    while tokens[j].is_punct(']') && j >= 1 && tokens[j - 1].is_punct('[') {
        j = j.checked_sub(2)?;
    }
    // `Type<Args> name`
    if tokens[j].is_punct('>') {
        let open = find_opening(window, Some(tokens[j].start), DelimiterPair::ANGLES, limits)?;
        j = tokens.iter().position(|t| t.start == open)?.checked_sub(1)?;
    }

    let type_token = &tokens[j];
    if !matches!(type_token.kind, TokenKind::Identifier | TokenKind::PrimitiveType)
        || !classify(type_token, window).is_type_like()
    {
        return None;
    }

    let mut start = j;
    while start >= 2 && tokens[start - 1].is_punct('.') && tokens[start - 2].kind == TokenKind::Identifier {
        start -= 2;
    }
    Some(window[tokens[start].start..type_end].to_string())
}

fn merge_generics(constructed: &str, declared: &str) -> String {
    let built = TypeRef::parse(constructed);
    let written = TypeRef::parse(declared);
    if !built.is_generic() && written.is_generic() {
        format!("{}<{}>", built.base, written.args.join(", "))
    } else {
        constructed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn declaration(window: &str, name: &str) -> Option<String> {
        find_local_declaration(window, name, &ScanLimits::default())
    }

    #[test]
    fn test_plain_declaration() {
        assert_eq!(declaration("Foo f = new Foo(); f.", "f").as_deref(), Some("Foo"));
        assert_eq!(declaration("int count = 0; count.", "count").as_deref(), Some("int"));
    }

    #[test]
    fn test_constructed_type_wins() {
        assert_eq!(
            declaration("Base item = new Derived(); item.", "item").as_deref(),
            Some("Derived")
        );
        assert_eq!(
            declaration("var names = new ArrayList<String>(); names.", "names").as_deref(),
            Some("ArrayList<String>")
        );
        assert_eq!(
            declaration("List<String> names = new ArrayList<>(); names.", "names").as_deref(),
            Some("ArrayList<String>")
        );
    }

    #[test]
    fn test_generic_array_and_varargs_declarations() {
        assert_eq!(
            declaration("Map<String, List<Integer>> index; index.", "index").as_deref(),
            Some("Map<String, List<Integer>>")
        );
        assert_eq!(declaration("String[] parts; parts.", "parts").as_deref(), Some("String[]"));
        assert_eq!(
            declaration("void log(String... lines) { lines.", "lines").as_deref(),
            Some("String...")
        );
        assert_eq!(
            declaration("java.util.List<String> xs; xs.", "xs").as_deref(),
            Some("java.util.List<String>")
        );
    }

    #[test]
    fn test_nearest_declaration_wins() {
        let window = indoc! {r#"
            Foo value = null;
            // Bar value
            {
                Bar value = null;
                value.
        "#};
        assert_eq!(declaration(window, "value").as_deref(), Some("Bar"));
    }

    #[test]
    fn test_non_declarations_are_ignored() {
        assert_eq!(declaration("return f; f.", "f"), None);
        assert_eq!(declaration("x = (Foo) f; f.", "f"), None);
        assert_eq!(declaration("other.f = 1; f.", "f"), None);
        assert_eq!(declaration("if (a > f) f.", "f"), None);
        assert_eq!(declaration("", "f"), None);
    }

    #[test]
    fn test_bind_placeholders() {
        let previous = TypeRef::parse("HashMap<String, Integer>");
        let params = vec!["K".to_string(), "V".to_string()];
        let bound = bind_placeholders(TypeRef::parse("V"), Some(&previous), &params);
        assert_eq!(bound.base, "Integer");

        let set = bind_placeholders(TypeRef::parse("Set<K>"), Some(&previous), &params);
        assert_eq!(set.args, vec!["String".to_string()]);

        let plain = bind_placeholders(TypeRef::parse("String"), Some(&previous), &params);
        assert_eq!(plain.base, "String");

        // Without generic arguments at the previous link the placeholder stays
        let raw = TypeRef::parse("List");
        assert_eq!(bind_placeholders(TypeRef::parse("E"), Some(&raw), &[]).base, "E");
    }
}
