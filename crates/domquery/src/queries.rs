//! Query kinds and the generated query families.
//!
//! Each [`QueryKind`] variant names one `query_all_by_*` primitive. The
//! `BuildQueries` derive expands every variant into the six public
//! functions `query_all_by_x`, `query_by_x`, `get_all_by_x`, `get_by_x`,
//! `find_by_x` and `find_all_by_x`, plus the same six methods on
//! [`Screen`](crate::screen::Screen). The cardinality checks they share live
//! here.

use std::fmt;

use domquery_derive::BuildQueries;

use crate::config::config;
use crate::dom::{Document, Element, NodeId};
use crate::matcher::{Matcher, MatcherOptions, SelectorMatcherOptions};
use crate::pretty::pretty_dom;
use crate::result::{QueryError, QueryResult};
use crate::role::ByRoleOptions;

/// Lookup strategy of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BuildQueries)]
pub enum QueryKind {
    /// ARIA role, optionally filtered by accessible name and state
    #[query(options = ByRoleOptions, collect = crate::role::collect_by_role)]
    Role,
    /// Own text content
    #[query(options = SelectorMatcherOptions, collect = crate::text::collect_by_text)]
    Text,
    /// Associated label text
    #[query(options = SelectorMatcherOptions, collect = crate::text::collect_by_label_text)]
    LabelText,
    /// `alt` attribute of images, image inputs and areas
    #[query(options = MatcherOptions, collect = crate::attributes::collect_by_alt_text)]
    AltText,
    /// Current value of form controls
    #[query(options = MatcherOptions, collect = crate::attributes::collect_by_display_value)]
    DisplayValue,
    /// Configured test-id attribute
    #[query(options = MatcherOptions, collect = crate::attributes::collect_by_test_id)]
    TestId,
    /// `placeholder` attribute
    #[query(options = MatcherOptions, collect = crate::attributes::collect_by_placeholder_text)]
    PlaceholderText,
    /// `title` attribute or SVG `<title>`
    #[query(options = MatcherOptions, collect = crate::attributes::collect_by_title)]
    Title,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl QueryKind {
    /// Message for a lookup that found nothing
    #[must_use]
    pub fn missing_message(self, matcher: &Matcher, detail: &str) -> String {
        match self {
            Self::Role => {
                format!("Unable to find an accessible element with the role \"{matcher}\"{detail}")
            }
            Self::Text => format!(
                "Unable to find an element with the text: {matcher}. This could be because the \
                 text is broken up by multiple elements. In this case, you can provide a \
                 predicate for your text matcher to make your matcher more flexible."
            ),
            Self::LabelText => format!("Unable to find a label with the text of: {matcher}"),
            Self::AltText => format!("Unable to find an element with the alt text: {matcher}"),
            Self::DisplayValue => {
                format!("Unable to find an element with the display value: {matcher}.")
            }
            Self::TestId => format!(
                "Unable to find an element by: [{}=\"{matcher}\"]",
                config().test_id_attribute
            ),
            Self::PlaceholderText => {
                format!("Unable to find an element with the placeholder text of: {matcher}")
            }
            Self::Title => format!("Unable to find an element with the title: {matcher}."),
        }
    }

    /// Message for a single-element lookup that found several
    #[must_use]
    pub fn multiple_message(self, matcher: &Matcher, detail: &str) -> String {
        match self {
            Self::Role => format!("Found multiple elements with the role \"{matcher}\"{detail}"),
            Self::Text => format!("Found multiple elements with the text: {matcher}"),
            Self::LabelText => format!("Found multiple elements with the text of: {matcher}"),
            Self::AltText => format!("Found multiple elements with the alt text: {matcher}"),
            Self::DisplayValue => {
                format!("Found multiple elements with the display value: {matcher}.")
            }
            Self::TestId => format!(
                "Found multiple elements by: [{}=\"{matcher}\"]",
                config().test_id_attribute
            ),
            Self::PlaceholderText => {
                format!("Found multiple elements with the placeholder text of: {matcher}")
            }
            Self::Title => format!("Found multiple elements with the title: {matcher}."),
        }
    }
}

/// Options types accepted by the query families
pub trait QueryOptions {
    /// Extra detail appended to error messages
    fn describe(&self) -> String {
        String::new()
    }
}

impl QueryOptions for ByRoleOptions {
    fn describe(&self) -> String {
        self.name
            .as_ref()
            .map(|name| format!(" and name \"{name}\""))
            .unwrap_or_default()
    }
}

impl QueryOptions for SelectorMatcherOptions {}

impl QueryOptions for MatcherOptions {}

fn with_dom(message: String, container: &Element) -> String {
    let config = config();
    if config.include_dom_in_errors {
        format!(
            "{message}\n\n{}",
            pretty_dom(container, config.dom_print_limit)
        )
    } else {
        message
    }
}

fn not_found<O: QueryOptions>(
    kind: QueryKind,
    container: &Element,
    matcher: &Matcher,
    options: &O,
) -> QueryError {
    let message = kind.missing_message(matcher, &options.describe());
    QueryError::NotFound {
        kind,
        matcher: matcher.to_string(),
        message: with_dom(message, container),
    }
}

fn multiple<O: QueryOptions>(
    kind: QueryKind,
    container: &Element,
    matcher: &Matcher,
    options: &O,
    count: usize,
) -> QueryError {
    let message = kind.multiple_message(matcher, &options.describe());
    QueryError::MultipleMatches {
        kind,
        matcher: matcher.to_string(),
        count,
        message: with_dom(message, container),
    }
}

/// At least one match, or `NotFound`
pub(crate) fn expect_some<O: QueryOptions>(
    kind: QueryKind,
    container: &Element,
    matcher: &Matcher,
    options: &O,
    found: Vec<Element>,
) -> QueryResult<Vec<Element>> {
    if found.is_empty() {
        return Err(not_found(kind, container, matcher, options));
    }
    Ok(found)
}

/// Zero or one match, or `MultipleMatches`
pub(crate) fn expect_at_most_one<O: QueryOptions>(
    kind: QueryKind,
    container: &Element,
    matcher: &Matcher,
    options: &O,
    mut found: Vec<Element>,
) -> QueryResult<Option<Element>> {
    match found.len() {
        0 | 1 => Ok(found.pop()),
        count => Err(multiple(kind, container, matcher, options, count)),
    }
}

/// Exactly one match
pub(crate) fn expect_one<O: QueryOptions>(
    kind: QueryKind,
    container: &Element,
    matcher: &Matcher,
    options: &O,
    found: Vec<Element>,
) -> QueryResult<Element> {
    expect_at_most_one(kind, container, matcher, options, found)?
        .ok_or_else(|| not_found(kind, container, matcher, options))
}

/// Keep the candidates with at least one text the matcher accepts.
///
/// Runs after the document lock is released, so predicate matchers may
/// inspect the element freely.
pub(crate) fn retain_matching(
    document: &Document,
    candidates: Vec<(NodeId, Vec<String>)>,
    matcher: &Matcher,
    options: &MatcherOptions,
) -> Vec<Element> {
    candidates
        .into_iter()
        .filter_map(|(node, texts)| {
            let element = document.element(node);
            texts
                .iter()
                .any(|text| matcher.matches(text, &element, options))
                .then_some(element)
        })
        .collect()
}
