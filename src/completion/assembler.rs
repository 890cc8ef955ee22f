//! Completion item assembly
//!
//! Collects the members visible on a resolved class and on every ancestor, dropping
//! names a subclass already contributed, and renders them as display labels plus
//! tab-stop insertion templates.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::debug;

use super::resolver::{is_relative, ResolvedReference};
use super::template::{method_template, placeholder_template};
use crate::config::MemberVisibility;
use crate::index::ClassRepository;
use crate::models::{ClassModel, FieldInfo, MethodInfo, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Method,
    StaticMethod,
    Field,
    StaticField,
    Constructor,
}

/// One candidate offered to the editing host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    /// `signature\ttype`, shortened when long
    pub label: String,
    pub insertion: String,
    pub kind: ItemKind,
}

impl CompletionItem {
    fn method(method: &MethodInfo, signature: &str, kind: ItemKind, label_width: usize) -> Self {
        Self {
            label: format!("{}\t{}", truncate_label(signature, label_width), method.return_type),
            insertion: method_template(&method.name, &method.params),
            kind,
        }
    }

    fn field(field: &FieldInfo, kind: ItemKind, label_width: usize) -> Self {
        Self {
            label: format!("{}\t{}", truncate_label(&field.name, label_width), field.type_name),
            insertion: field.name.clone(),
            kind,
        }
    }

    /// Entry for `new Type(` where the `(` is already typed
    pub fn constructor(signature: &str, params: &str, label_width: usize) -> Self {
        Self {
            label: truncate_label(signature, label_width),
            insertion: format!("{})", placeholder_template(params)),
            kind: ItemKind::Constructor,
        }
    }
}

/// Shortens `text` to `width` characters followed by `...`
pub fn truncate_label(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width).collect();
    format!("{}...", head.trim_end())
}

pub struct CompletionAssembler<'a> {
    repository: &'a mut ClassRepository,
    editing: Option<&'a ClassModel>,
    visibility: MemberVisibility,
    label_width: usize,
}

impl<'a> CompletionAssembler<'a> {
    pub fn new(
        repository: &'a mut ClassRepository,
        editing: Option<&'a ClassModel>,
        visibility: MemberVisibility,
        label_width: usize,
    ) -> Self {
        Self {
            repository,
            editing,
            visibility,
            label_width,
        }
    }

    /// Items for `resolved`, keeping only members whose name starts with `prefix`
    /// (case-insensitive), sorted by label
    pub fn assemble(&mut self, resolved: &ResolvedReference, prefix: &str) -> Vec<CompletionItem> {
        let Some(start) = resolved.class.clone() else {
            return Vec::new();
        };
        let prefix = prefix.to_lowercase();
        let mut seen_methods: FxHashSet<String> = FxHashSet::default();
        let mut seen_fields: FxHashSet<String> = FxHashSet::default();
        let mut items = Vec::new();

        for model in self.ancestry(start) {
            let show_private = self.editing.is_some_and(|editing| is_relative(&model, editing));
            let visible = |visibility: Visibility| show_private || !visibility.is_private();
            let wanted = |name: &str| name.to_lowercase().starts_with(&prefix);

            let mut methods: Vec<(&String, &MethodInfo, ItemKind)> = Vec::new();
            if !resolved.static_only {
                methods.extend(model.methods.iter().map(|(s, m)| (s, m, ItemKind::Method)));
            }
            if self.visibility.static_methods {
                methods.extend(model.static_methods.iter().map(|(s, m)| (s, m, ItemKind::StaticMethod)));
            }
            for (signature, method, kind) in methods {
                if visible(method.visibility) && wanted(&method.name) && seen_methods.insert(signature.clone()) {
                    items.push(CompletionItem::method(method, signature, kind, self.label_width));
                }
            }

            let mut fields: Vec<(&FieldInfo, ItemKind)> = Vec::new();
            if !resolved.static_only && self.visibility.instance_fields {
                fields.extend(model.fields.values().map(|f| (f, ItemKind::Field)));
            }
            if self.visibility.static_fields {
                fields.extend(model.static_fields.values().map(|f| (f, ItemKind::StaticField)));
            }
            for (field, kind) in fields {
                if visible(field.visibility) && wanted(&field.name) && seen_fields.insert(field.name.clone()) {
                    items.push(CompletionItem::field(field, kind, self.label_width));
                }
            }
        }

        items.sort_by(|a, b| a.label.cmp(&b.label));
        debug!("Assembled {} completion items", items.len());
        items
    }

    /// `start` followed by its superclasses, stopping at a missing link or a cycle
    fn ancestry(&mut self, start: Arc<ClassModel>) -> Vec<Arc<ClassModel>> {
        let mut visited = FxHashSet::default();
        let mut chain = Vec::new();
        let mut current = Some(start);

        while let Some(model) = current.take() {
            if !visited.insert(model.name.clone()) {
                debug!("Inheritance cycle at {}", model.name);
                break;
            }
            current = model.superclass.as_deref().and_then(|superclass| {
                self.repository
                    .resolve_class(superclass, self.editing)
                    .map_err(|e| debug!("Ancestor walk stops at {}: {}", superclass, e))
                    .ok()
            });
            chain.push(model);
        }
        chain
    }
}
