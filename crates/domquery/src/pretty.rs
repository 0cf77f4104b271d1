//! HTML serialization for `outer_html` and error-message DOM snapshots.

use std::fmt::Write as _;

use crate::dom::{Element, NodeData, NodeId, Tree};
use crate::html::VOID_ELEMENTS;

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn open_tag(out: &mut String, tree: &Tree, node: NodeId) {
    let Some(element) = tree.element(node) else {
        return;
    };
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
    }
    out.push('>');
}

/// Compact serialization of a node and its subtree
pub(crate) fn outer_html(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    write_compact(tree, node, &mut out);
    out
}

fn write_compact(tree: &Tree, node: NodeId, out: &mut String) {
    match &tree.node(node).data {
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Document => {
            for child in tree.children(node) {
                write_compact(tree, *child, out);
            }
        }
        NodeData::Element(element) => {
            open_tag(out, tree, node);
            if is_void(&element.tag) {
                return;
            }
            for child in tree.children(node) {
                write_compact(tree, *child, out);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}

/// Indented serialization, truncated to `limit` characters
pub(crate) fn pretty_tree(tree: &Tree, node: NodeId, limit: usize) -> String {
    let mut out = String::new();
    write_pretty(tree, node, 0, &mut out);
    let trimmed = out.trim_end();
    if trimmed.chars().count() > limit {
        let cut: String = trimmed.chars().take(limit).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

fn write_pretty(tree: &Tree, node: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match &tree.node(node).data {
        NodeData::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                let _ = writeln!(out, "{indent}{}", escape_text(text));
            }
        }
        NodeData::Document => {
            for child in tree.children(node) {
                write_pretty(tree, *child, depth, out);
            }
        }
        NodeData::Element(element) => {
            out.push_str(&indent);
            open_tag(out, tree, node);
            out.push('\n');
            if is_void(&element.tag) {
                return;
            }
            for child in tree.children(node) {
                write_pretty(tree, *child, depth + 1, out);
            }
            let _ = writeln!(out, "{indent}</{}>", element.tag);
        }
    }
}

/// Pretty-print an element's subtree for debugging
#[must_use]
pub fn pretty_dom(element: &Element, limit: usize) -> String {
    pretty_tree(&element.document().read(), element.node_id(), limit)
}
