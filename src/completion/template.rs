//! Tab-stop insertion templates

use crate::models::split_top_level;

/// Turns `int a, Map<K, V> m` into `${1:int a}, ${2:Map<K, V> m}`
pub fn placeholder_template(params: &str) -> String {
    split_top_level(params, ',')
        .iter()
        .enumerate()
        .map(|(idx, param)| format!("${{{}:{}}}", idx + 1, escape(param)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insertion text for a method call
pub fn method_template(name: &str, params: &str) -> String {
    format!("{}({})", name, placeholder_template(params))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
