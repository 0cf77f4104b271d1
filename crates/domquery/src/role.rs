//! ARIA roles, accessible names and the role query.
//!
//! Covers the common subset of the HTML-AAM implicit role mapping and a
//! simplified accessible-name computation (labelledby, aria-label, labels,
//! alt, button values, name-from-content, title).

use crate::config::config;
use crate::dom::{Element, NodeData, NodeId, Tree};
use crate::matcher::{default_normalize, Matcher};
use crate::result::QueryResult;

/// Roles whose accessible name is computed from their content
const NAME_FROM_CONTENT: &[&str] = &[
    "button",
    "cell",
    "checkbox",
    "columnheader",
    "gridcell",
    "heading",
    "link",
    "menuitem",
    "option",
    "radio",
    "row",
    "rowheader",
    "switch",
    "tab",
    "tooltip",
    "treeitem",
];

/// Elements a `<label>` can label
pub(crate) const LABELABLE: &[&str] = &[
    "button", "input", "meter", "output", "progress", "select", "textarea",
];

/// Options for `*_by_role` queries
#[derive(Debug, Clone, Default)]
pub struct ByRoleOptions {
    /// Match the accessible name
    pub name: Option<Matcher>,
    /// Include inaccessible elements (`None` uses the configured default)
    pub hidden: Option<bool>,
    /// `aria-checked` / checked state
    pub checked: Option<bool>,
    /// `aria-selected` / selected state
    pub selected: Option<bool>,
    /// `aria-pressed` state
    pub pressed: Option<bool>,
    /// `aria-expanded` state
    pub expanded: Option<bool>,
    /// Heading level
    pub level: Option<u32>,
    /// Match any token of an explicit `role` list, not just the first
    pub query_fallbacks: bool,
}

impl ByRoleOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an accessible name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<Matcher>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Include or exclude inaccessible elements
    #[must_use]
    pub const fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Require a checked state
    #[must_use]
    pub const fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Require a selected state
    #[must_use]
    pub const fn with_selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    /// Require a pressed state
    #[must_use]
    pub const fn with_pressed(mut self, pressed: bool) -> Self {
        self.pressed = Some(pressed);
        self
    }

    /// Require an expanded state
    #[must_use]
    pub const fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = Some(expanded);
        self
    }

    /// Require a heading level
    #[must_use]
    pub const fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Match fallback roles in explicit role lists
    #[must_use]
    pub const fn with_query_fallbacks(mut self, enabled: bool) -> Self {
        self.query_fallbacks = enabled;
        self
    }
}

/// Implicit ARIA role of an element, from its tag and attributes
pub(crate) fn implicit_role(tree: &Tree, node: NodeId) -> Option<&'static str> {
    let has = |name: &str| tree.attr(node, name).is_some();
    let role = match tree.tag(node) {
        "a" | "area" if has("href") => "link",
        "article" => "article",
        "aside" => "complementary",
        "button" => "button",
        "datalist" => "listbox",
        "dd" => "definition",
        "details" | "fieldset" | "optgroup" => "group",
        "dialog" => "dialog",
        "dt" => "term",
        "figure" => "figure",
        "footer" => "contentinfo",
        "form" => "form",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "header" => "banner",
        "hr" => "separator",
        "img" if tree.attr(node, "alt") == Some("") => "presentation",
        "img" => "img",
        "input" => return input_role(tree, node),
        "li" => "listitem",
        "main" => "main",
        "menu" | "ol" | "ul" => "list",
        "meter" => "meter",
        "nav" => "navigation",
        "option" => "option",
        "output" => "status",
        "p" => "paragraph",
        "progress" => "progressbar",
        "section" => "region",
        "select" => {
            let size = tree
                .attr(node, "size")
                .and_then(|size| size.parse::<u32>().ok())
                .unwrap_or(0);
            if has("multiple") || size > 1 {
                "listbox"
            } else {
                "combobox"
            }
        }
        "table" => "table",
        "tbody" | "tfoot" | "thead" => "rowgroup",
        "td" => "cell",
        "textarea" => "textbox",
        "th" => "columnheader",
        "tr" => "row",
        _ => return None,
    };
    Some(role)
}

fn input_role(tree: &Tree, node: NodeId) -> Option<&'static str> {
    let kind = tree
        .attr(node, "type")
        .map_or_else(|| "text".to_string(), str::to_ascii_lowercase);
    let has_list = tree.attr(node, "list").is_some();
    let role = match kind.as_str() {
        "button" | "image" | "reset" | "submit" => "button",
        "checkbox" => "checkbox",
        "radio" => "radio",
        "range" => "slider",
        "number" => "spinbutton",
        "hidden" | "password" | "color" | "file" => return None,
        "search" if !has_list => "searchbox",
        _ if has_list => "combobox",
        _ => "textbox",
    };
    Some(role)
}

/// Roles an element is matched against, in priority order
pub(crate) fn element_roles(tree: &Tree, node: NodeId, query_fallbacks: bool) -> Vec<String> {
    if let Some(explicit) = tree.attr(node, "role") {
        let mut tokens = explicit.split_whitespace().map(str::to_string);
        return if query_fallbacks {
            tokens.collect()
        } else {
            tokens.next().into_iter().collect()
        };
    }
    implicit_role(tree, node)
        .map(|role| vec![role.to_string()])
        .unwrap_or_default()
}

fn hides_itself(tree: &Tree, node: NodeId) -> bool {
    if tree.attr(node, "hidden").is_some() || tree.attr(node, "aria-hidden") == Some("true") {
        return true;
    }
    tree.attr(node, "style").is_some_and(|style| {
        style.split(';').any(|declaration| {
            let Some((property, value)) = declaration.split_once(':') else {
                return false;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().to_ascii_lowercase();
            (property == "display" && value == "none")
                || (property == "visibility" && value == "hidden")
        })
    })
}

/// Whether the element or an ancestor removes it from the accessibility tree
pub(crate) fn is_inaccessible(tree: &Tree, node: NodeId) -> bool {
    hides_itself(tree, node) || tree.ancestors(node).any(|ancestor| hides_itself(tree, ancestor))
}

fn boolean_attribute(tree: &Tree, node: NodeId, name: &str) -> Option<bool> {
    match tree.attr(node, name) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

fn is_check_input(tree: &Tree, node: NodeId) -> bool {
    tree.tag(node) == "input"
        && tree
            .attr(node, "type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio"))
}

pub(crate) fn checked_state(tree: &Tree, node: NodeId) -> Option<bool> {
    if is_check_input(tree, node) {
        return Some(tree.attr(node, "checked").is_some());
    }
    boolean_attribute(tree, node, "aria-checked")
}

pub(crate) fn selected_state(tree: &Tree, node: NodeId) -> Option<bool> {
    if tree.tag(node) == "option" {
        let select = tree.ancestors(node).find(|ancestor| tree.tag(*ancestor) == "select");
        return Some(select.map_or_else(
            || tree.attr(node, "selected").is_some(),
            |select| tree.selected_options(select).contains(&node),
        ));
    }
    boolean_attribute(tree, node, "aria-selected")
}

pub(crate) fn heading_level(tree: &Tree, node: NodeId) -> Option<u32> {
    if let Some(level) = tree.attr(node, "aria-level").and_then(|level| level.parse().ok()) {
        return Some(level);
    }
    tree.tag(node)
        .strip_prefix('h')
        .and_then(|digit| digit.parse::<u32>().ok())
        .filter(|level| (1..=6).contains(level))
}

fn state_matches(tree: &Tree, node: NodeId, options: &ByRoleOptions) -> bool {
    let wants = |want: Option<bool>, have: Option<bool>| want.is_none() || want == have;
    wants(options.checked, checked_state(tree, node))
        && wants(options.selected, selected_state(tree, node))
        && wants(options.pressed, boolean_attribute(tree, node, "aria-pressed"))
        && wants(options.expanded, boolean_attribute(tree, node, "aria-expanded"))
        && options
            .level
            .map_or(true, |level| heading_level(tree, node) == Some(level))
}

/// Text of a label, skipping the text of labelled controls nested in it
pub(crate) fn label_content(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    collect_label_content(tree, node, &mut out);
    out
}

fn collect_label_content(tree: &Tree, node: NodeId, out: &mut String) {
    for child in tree.children(node) {
        match &tree.node(*child).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(element) if LABELABLE.contains(&element.tag.as_str()) => {}
            NodeData::Element(_) | NodeData::Document => collect_label_content(tree, *child, out),
        }
    }
}

/// `<label>` elements associated with a labelable element
pub(crate) fn labels_of(tree: &Tree, node: NodeId) -> Vec<NodeId> {
    if !LABELABLE.contains(&tree.tag(node)) {
        return Vec::new();
    }
    let mut labels: Vec<NodeId> = tree
        .ancestors(node)
        .filter(|ancestor| tree.tag(*ancestor) == "label" && tree.attr(*ancestor, "for").is_none())
        .collect();
    if let Some(id) = tree.attr(node, "id").filter(|id| !id.is_empty()) {
        let root = tree.ancestors(node).last().unwrap_or(node);
        labels.extend(
            tree.descendant_elements(root)
                .into_iter()
                .filter(|label| tree.tag(*label) == "label" && tree.attr(*label, "for") == Some(id)),
        );
    }
    labels
}

/// Element ids referenced by `aria-labelledby`
pub(crate) fn labelledby_targets(tree: &Tree, node: NodeId) -> Vec<NodeId> {
    tree.attr(node, "aria-labelledby")
        .map(|ids| {
            ids.split_whitespace()
                .filter_map(|id| tree.get_element_by_id(id))
                .collect()
        })
        .unwrap_or_default()
}

fn content_name(tree: &Tree, node: NodeId, out: &mut String) {
    for child in tree.children(node) {
        match &tree.node(*child).data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(element) => {
                if hides_itself(tree, *child) {
                    continue;
                }
                if let Some(label) = element.attr("aria-label").filter(|l| !l.trim().is_empty()) {
                    out.push_str(label);
                } else if element.tag == "img" {
                    out.push_str(element.attr("alt").unwrap_or_default());
                } else {
                    content_name(tree, *child, out);
                }
            }
            NodeData::Document => {}
        }
    }
}

/// Simplified accessible name
pub(crate) fn accessible_name(tree: &Tree, node: NodeId) -> String {
    let raw = raw_accessible_name(tree, node);
    default_normalize(&raw, true, true)
}

fn raw_accessible_name(tree: &Tree, node: NodeId) -> String {
    let labelledby = labelledby_targets(tree, node);
    if !labelledby.is_empty() {
        return labelledby
            .into_iter()
            .map(|target| tree.text_content(target))
            .collect::<Vec<_>>()
            .join(" ");
    }
    if let Some(label) = tree.attr(node, "aria-label").filter(|l| !l.trim().is_empty()) {
        return label.to_string();
    }

    let tag = tree.tag(node);
    if tag == "input" {
        let kind = tree.attr(node, "type").unwrap_or("text").to_ascii_lowercase();
        match kind.as_str() {
            "button" | "submit" | "reset" => {
                let fallback = match kind.as_str() {
                    "submit" => "Submit",
                    "reset" => "Reset",
                    _ => "",
                };
                return tree.attr(node, "value").unwrap_or(fallback).to_string();
            }
            "image" => return tree.attr(node, "alt").unwrap_or_default().to_string(),
            _ => {}
        }
    }

    let labels = labels_of(tree, node);
    if !labels.is_empty() {
        return labels
            .into_iter()
            .map(|label| label_content(tree, label))
            .collect::<Vec<_>>()
            .join(" ");
    }

    match tag {
        "img" | "area" => {
            if let Some(alt) = tree.attr(node, "alt") {
                return alt.to_string();
            }
        }
        "fieldset" | "table" | "figure" => {
            let caption = match tag {
                "fieldset" => "legend",
                "table" => "caption",
                _ => "figcaption",
            };
            if let Some(child) = tree.child_elements(node).find(|c| tree.tag(*c) == caption) {
                return tree.text_content(child);
            }
        }
        _ => {}
    }

    let from_content = element_roles(tree, node, false)
        .first()
        .is_some_and(|role| NAME_FROM_CONTENT.contains(&role.as_str()));
    if from_content {
        let mut out = String::new();
        content_name(tree, node, &mut out);
        if !out.trim().is_empty() {
            return out;
        }
    }

    tree.attr(node, "title").unwrap_or_default().to_string()
}

/// Computed accessible name of an element
#[must_use]
pub fn compute_accessible_name(element: &Element) -> String {
    accessible_name(&element.document().read(), element.node_id())
}

/// Candidates for `query_all_by_role`: descendants of the container whose
/// role (and, when requested, accessible name and state) match
pub(crate) fn collect_by_role(
    container: &Element,
    role: &Matcher,
    options: &ByRoleOptions,
) -> QueryResult<Vec<Element>> {
    let include_hidden = options.hidden.unwrap_or_else(|| config().default_hidden);
    let document = container.document();
    let candidates: Vec<(NodeId, Vec<String>, Option<String>)> = {
        let tree = document.read();
        tree.descendant_elements(container.node_id())
            .into_iter()
            .filter(|node| include_hidden || !is_inaccessible(&tree, *node))
            .filter(|node| state_matches(&tree, *node, options))
            .map(|node| {
                let roles = element_roles(&tree, node, options.query_fallbacks);
                let name = options.name.as_ref().map(|_| accessible_name(&tree, node));
                (node, roles, name)
            })
            .filter(|(_, roles, _)| !roles.is_empty())
            .collect()
    };

    Ok(candidates
        .into_iter()
        .filter_map(|(node, roles, name)| {
            let element = document.element(node);
            let role_matches = roles
                .iter()
                .any(|candidate| role.matches_normalized(candidate, &element, true));
            let name_matches = match (&options.name, name) {
                (Some(matcher), Some(name)) => matcher.matches_normalized(&name, &element, true),
                _ => true,
            };
            (role_matches && name_matches).then_some(element)
        })
        .collect())
}
