//! Text and label queries.

use crate::config::config;
use crate::css::SelectorList;
use crate::dom::{Element, NodeId, Tree};
use crate::matcher::{IgnoreRule, Matcher, SelectorMatcherOptions};
use crate::queries::retain_matching;
use crate::result::QueryResult;
use crate::role::{label_content, labelledby_targets, labels_of};

fn ignore_list(rule: &IgnoreRule) -> QueryResult<Option<SelectorList>> {
    let selector = match rule {
        IgnoreRule::Disabled => return Ok(None),
        IgnoreRule::Selector(selector) => selector.clone(),
        IgnoreRule::Configured => config().default_ignore,
    };
    if selector.trim().is_empty() {
        return Ok(None);
    }
    SelectorList::parse(&selector).map(Some)
}

/// Text a text query sees for a node: its own text, or the value of
/// button-like inputs
fn node_text(tree: &Tree, node: NodeId) -> String {
    if tree.tag(node) == "input" {
        let kind = tree.attr(node, "type").unwrap_or_default().to_ascii_lowercase();
        if matches!(kind.as_str(), "submit" | "button" | "reset") {
            return tree.attr(node, "value").unwrap_or_default().to_string();
        }
    }
    tree.own_text(node)
}

/// Elements (container included) matching `options.selector`, not ignored,
/// whose own text matches
pub(crate) fn collect_by_text(
    container: &Element,
    matcher: &Matcher,
    options: &SelectorMatcherOptions,
) -> QueryResult<Vec<Element>> {
    let selector = SelectorList::parse(&options.selector)?;
    let ignore = ignore_list(&options.ignore)?;
    let document = container.document();
    let candidates = {
        let tree = document.read();
        let root = container.node_id();
        std::iter::once(root)
            .filter(|node| selector.matches(&tree, *node))
            .chain(
                tree.descendant_elements(root)
                    .into_iter()
                    .filter(|node| selector.matches(&tree, *node)),
            )
            .filter(|node| !ignore.as_ref().is_some_and(|ignore| ignore.matches(&tree, *node)))
            .map(|node| (node, vec![node_text(&tree, node)]))
            .collect()
    };
    Ok(retain_matching(document, candidates, matcher, &options.base))
}

fn label_texts(tree: &Tree, node: NodeId) -> Vec<String> {
    let mut texts: Vec<String> = labelledby_targets(tree, node)
        .into_iter()
        .map(|target| {
            if tree.tag(target) == "label" {
                label_content(tree, target)
            } else {
                tree.text_content(target)
            }
        })
        .collect();
    texts.extend(
        labels_of(tree, node)
            .into_iter()
            .map(|label| label_content(tree, label)),
    );
    if let Some(label) = tree.attr(node, "aria-label") {
        texts.push(label.to_string());
    }
    texts
}

/// Elements matching `options.selector` that are labelled by matching text
pub(crate) fn collect_by_label_text(
    container: &Element,
    matcher: &Matcher,
    options: &SelectorMatcherOptions,
) -> QueryResult<Vec<Element>> {
    let selector = SelectorList::parse(&options.selector)?;
    let document = container.document();
    let candidates = {
        let tree = document.read();
        tree.descendant_elements(container.node_id())
            .into_iter()
            .filter(|node| selector.matches(&tree, *node))
            .map(|node| (node, label_texts(&tree, node)))
            .filter(|(_, texts)| !texts.is_empty())
            .collect()
    };
    Ok(retain_matching(document, candidates, matcher, &options.base))
}
