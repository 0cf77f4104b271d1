//! Attribute-bound queries: alt text, display value, test id, placeholder
//! and title.

use crate::config::config;
use crate::dom::{Element, NodeId, Tree};
use crate::matcher::{Matcher, MatcherOptions};
use crate::queries::retain_matching;
use crate::result::QueryResult;

/// Descendants of `container` accepted by `accept`, paired with the texts
/// `texts` extracts from them
fn collect<A, T>(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
    accept: A,
    texts: T,
) -> Vec<Element>
where
    A: Fn(&Tree, NodeId) -> bool,
    T: Fn(&Tree, NodeId) -> Vec<String>,
{
    let document = container.document();
    let candidates = {
        let tree = document.read();
        tree.descendant_elements(container.node_id())
            .into_iter()
            .filter(|node| accept(&tree, *node))
            .map(|node| (node, texts(&tree, node)))
            .filter(|(_, texts)| !texts.is_empty())
            .collect()
    };
    retain_matching(document, candidates, matcher, options)
}

fn attribute_text(name: &str) -> impl Fn(&Tree, NodeId) -> Vec<String> + '_ {
    move |tree: &Tree, node: NodeId| tree.attr(node, name).map(str::to_string).into_iter().collect()
}

fn any_element(_: &Tree, _: NodeId) -> bool {
    true
}

pub(crate) fn collect_by_alt_text(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> QueryResult<Vec<Element>> {
    let accept = |tree: &Tree, node: NodeId| {
        let tag = tree.tag(node);
        matches!(tag, "img" | "input" | "area") || tag.contains('-')
    };
    Ok(collect(container, matcher, options, accept, attribute_text("alt")))
}

pub(crate) fn collect_by_display_value(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> QueryResult<Vec<Element>> {
    let accept = |tree: &Tree, node: NodeId| matches!(tree.tag(node), "input" | "select" | "textarea");
    let texts = |tree: &Tree, node: NodeId| {
        if tree.tag(node) == "select" {
            tree.selected_options(node)
                .into_iter()
                .map(|option| tree.text_content(option))
                .collect()
        } else {
            vec![tree.value(node)]
        }
    };
    Ok(collect(container, matcher, options, accept, texts))
}

pub(crate) fn collect_by_test_id(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> QueryResult<Vec<Element>> {
    let attribute = config().test_id_attribute;
    Ok(collect(
        container,
        matcher,
        options,
        any_element,
        attribute_text(&attribute),
    ))
}

pub(crate) fn collect_by_placeholder_text(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> QueryResult<Vec<Element>> {
    Ok(collect(
        container,
        matcher,
        options,
        any_element,
        attribute_text("placeholder"),
    ))
}

/// `title` attributes, plus `<title>` elements directly inside an `<svg>`
pub(crate) fn collect_by_title(
    container: &Element,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> QueryResult<Vec<Element>> {
    let texts = |tree: &Tree, node: NodeId| {
        let svg_title = tree.tag(node) == "title"
            && tree
                .parent_element(node)
                .is_some_and(|parent| tree.tag(parent) == "svg");
        if svg_title {
            vec![tree.text_content(node)]
        } else {
            tree.attr(node, "title").map(str::to_string).into_iter().collect()
        }
    };
    Ok(collect(container, matcher, options, any_element, texts))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{configure, set_config, QueryConfig};
    use crate::dom::Document;

    fn ids(found: &[Element]) -> Vec<String> {
        found
            .iter()
            .map(|element| element.attribute("id").unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_alt_text_limited_to_images_inputs_and_areas() {
        let document = Document::from_html(
            r#"<img id=a alt="Logo"><div id=b alt="Logo"></div><input id=c type=image alt="Logo"><my-icon id=d alt="Logo"></my-icon>"#,
        )
        .unwrap();
        let found =
            collect_by_alt_text(&document.body(), &"Logo".into(), &MatcherOptions::default()).unwrap();
        assert_eq!(ids(&found), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_display_value() {
        let document = Document::from_html(
            r#"<input id=i value="Ada"><textarea id=t>Notes</textarea>
               <select id=s><option>Red</option><option selected>Blue</option></select>"#,
        )
        .unwrap();
        let body = document.body();
        let options = MatcherOptions::default();
        assert_eq!(ids(&collect_by_display_value(&body, &"Ada".into(), &options).unwrap()), vec!["i"]);
        assert_eq!(ids(&collect_by_display_value(&body, &"Notes".into(), &options).unwrap()), vec!["t"]);
        assert_eq!(ids(&collect_by_display_value(&body, &"Blue".into(), &options).unwrap()), vec!["s"]);
        assert!(collect_by_display_value(&body, &"Red".into(), &options).unwrap().is_empty());
    }

    #[test]
    fn test_display_value_with_unclosed_options() {
        let document =
            Document::from_html("<select id=s><option>Red<option>Blue</select>").unwrap();
        let body = document.body();
        let options = MatcherOptions::default();
        assert_eq!(ids(&collect_by_display_value(&body, &"Red".into(), &options).unwrap()), vec!["s"]);
        assert!(collect_by_display_value(&body, &"Blue".into(), &options).unwrap().is_empty());
        assert_eq!(document.get_element_by_id("s").unwrap().value(), "Red");
    }

    #[test]
    fn test_display_value_tracks_live_value() {
        let document = Document::from_html(r#"<input id=i value="old">"#).unwrap();
        document.get_element_by_id("i").unwrap().set_value("new");
        let found =
            collect_by_display_value(&document.body(), &"new".into(), &MatcherOptions::default())
                .unwrap();
        assert_eq!(ids(&found), vec!["i"]);
    }

    #[test]
    fn test_test_id_uses_configured_attribute() {
        let document =
            Document::from_html(r#"<p id=a data-testid="item"></p><p id=b data-qa="item"></p>"#)
                .unwrap();
        let body = document.body();
        let options = MatcherOptions::default();
        assert_eq!(ids(&collect_by_test_id(&body, &"item".into(), &options).unwrap()), vec!["a"]);

        configure(|config| config.test_id_attribute = "data-qa".to_string());
        assert_eq!(ids(&collect_by_test_id(&body, &"item".into(), &options).unwrap()), vec!["b"]);
        set_config(QueryConfig::default());
    }

    #[test]
    fn test_placeholder() {
        let document = Document::from_html(r#"<input id=e placeholder="Email">"#).unwrap();
        let found = collect_by_placeholder_text(
            &document.body(),
            &"email".into(),
            &MatcherOptions::default().with_exact(false),
        )
        .unwrap();
        assert_eq!(ids(&found), vec!["e"]);
    }

    #[test]
    fn test_title_attribute_and_svg_title() {
        let document = Document::from_html(
            r#"<span id=a title="Close"></span><svg id=s><title id=t>Close</title></svg><title id=x>Close</title>"#,
        )
        .unwrap();
        let found =
            collect_by_title(&document.body(), &"Close".into(), &MatcherOptions::default()).unwrap();
        assert_eq!(ids(&found), vec!["a", "t"]);
    }
}
