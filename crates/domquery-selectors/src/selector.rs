//! Selectors and the `by_*` builders.
//!
//! A [`Selector`] is an immutable selection plus six retrieval operations.
//! Nothing runs until an operation is called, and every call re-runs the
//! provider lookup against the live document.
//!
//! # Example
//!
//! ```ignore
//! use domquery_selectors::prelude::*;
//!
//! let submit = by_role_with("button", ByRoleOptions::new().with_name("Submit"));
//! let button = submit.get(None)?;
//! let scoped = by_test_id("item").query_all(Some(&list))?;
//! let late = by_text("late").find(None, Some(&WaitForOptions::new().with_timeout(200))).await?;
//! ```

use domquery::{
    screen, ByRoleOptions, Element, Matcher, MatcherOptions, SelectorMatcherOptions,
    WaitForOptions,
};
use tracing::debug;

use crate::dispatch::{dispatch_table, Binding, Found, Lookup, Operation, QueryId};
use crate::result::{SelectorError, SelectorResult};
use crate::selection::{BoundAttribute, Selection, TextQuery};

/// A lazily-dispatched element lookup
#[derive(Debug, Clone)]
pub struct Selector {
    selection: Selection,
}

impl Selector {
    /// Wrap a selection
    #[must_use]
    pub const fn new(selection: Selection) -> Self {
        Self { selection }
    }

    /// The wrapped selection
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Identifier `operation` dispatches to, e.g. `findByRole`
    #[must_use]
    pub const fn query_id(&self, operation: Operation) -> QueryId {
        QueryId::new(operation, self.selection.strategy())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Exactly one match; errors on none or several
    pub fn get(&self, root: Option<&Element>) -> SelectorResult<Element> {
        let id = self.query_id(Operation::Get);
        self.call(id, root)?.into_one(id)
    }

    /// At least one match; errors on none
    pub fn get_all(&self, root: Option<&Element>) -> SelectorResult<Vec<Element>> {
        let id = self.query_id(Operation::GetAll);
        self.call(id, root)?.into_many(id)
    }

    /// Zero or one match; errors on several
    pub fn query(&self, root: Option<&Element>) -> SelectorResult<Option<Element>> {
        let id = self.query_id(Operation::Query);
        self.call(id, root)?.into_maybe(id)
    }

    /// Any number of matches
    pub fn query_all(&self, root: Option<&Element>) -> SelectorResult<Vec<Element>> {
        let id = self.query_id(Operation::QueryAll);
        self.call(id, root)?.into_many(id)
    }

    /// Wait for exactly one match.
    ///
    /// `wait` goes to the provider unchanged; `None` uses its defaults.
    ///
    /// A `None` root means the page mounted on the calling thread. Futures
    /// moved into `tokio::spawn` on a multi-thread runtime may run elsewhere
    /// and fail with `NoPage`; pass the container explicitly there.
    pub async fn find(
        &self,
        root: Option<&Element>,
        wait: Option<&WaitForOptions>,
    ) -> SelectorResult<Element> {
        let id = self.query_id(Operation::Find);
        self.call_async(id, root, wait).await?.into_one(id)
    }

    /// Wait for at least one match.
    ///
    /// Root and wait handling as for [`Selector::find`].
    pub async fn find_all(
        &self,
        root: Option<&Element>,
        wait: Option<&WaitForOptions>,
    ) -> SelectorResult<Vec<Element>> {
        let id = self.query_id(Operation::FindAll);
        self.call_async(id, root, wait).await?.into_many(id)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn call(&self, id: QueryId, root: Option<&Element>) -> SelectorResult<Found> {
        let binding = dispatch_table()?.binding(id)?;
        let container = resolve_root(root)?;
        debug!(query = %id, scoped = root.is_some(), matcher = %self.selection.matcher(), "dispatching");

        let found = match (binding, &self.selection) {
            (Binding::Role(Lookup::Sync(lookup)), Selection::Role { matcher, options }) => {
                lookup(&container, matcher, options)
            }
            (Binding::Text(Lookup::Sync(lookup)), Selection::Text { matcher, options, .. }) => {
                lookup(&container, matcher, options)
            }
            (
                Binding::Text(Lookup::Sync(lookup)),
                Selection::BoundAttribute {
                    matcher, options, ..
                },
            ) => lookup(
                &container,
                matcher,
                &SelectorMatcherOptions::from(options.clone()),
            ),
            (
                Binding::Attribute(Lookup::Sync(lookup)),
                Selection::BoundAttribute {
                    matcher, options, ..
                },
            ) => lookup(&container, matcher, options),
            _ => return Err(mismatch(id)),
        };
        Ok(found?)
    }

    async fn call_async(
        &self,
        id: QueryId,
        root: Option<&Element>,
        wait: Option<&WaitForOptions>,
    ) -> SelectorResult<Found> {
        let binding = dispatch_table()?.binding(id)?;
        let container = resolve_root(root)?;
        debug!(query = %id, scoped = root.is_some(), matcher = %self.selection.matcher(), "dispatching");

        let found = match (binding, &self.selection) {
            (Binding::Role(Lookup::Async(lookup)), Selection::Role { matcher, options }) => {
                lookup(&container, matcher, options, wait).await
            }
            (Binding::Text(Lookup::Async(lookup)), Selection::Text { matcher, options, .. }) => {
                lookup(&container, matcher, options, wait).await
            }
            (
                Binding::Text(Lookup::Async(lookup)),
                Selection::BoundAttribute {
                    matcher, options, ..
                },
            ) => {
                let options = SelectorMatcherOptions::from(options.clone());
                lookup(&container, matcher, &options, wait).await
            }
            (
                Binding::Attribute(Lookup::Async(lookup)),
                Selection::BoundAttribute {
                    matcher, options, ..
                },
            ) => lookup(&container, matcher, options, wait).await,
            _ => return Err(mismatch(id)),
        };
        Ok(found?)
    }
}

/// `Some(root)` scopes to that subtree; `None` means the page body
fn resolve_root(root: Option<&Element>) -> SelectorResult<Element> {
    match root {
        Some(root) => Ok(root.clone()),
        None => Ok(screen()?.container()),
    }
}

fn mismatch(id: QueryId) -> SelectorError {
    SelectorError::dispatch(id.name(), "binding does not accept this selection")
}

impl Found {
    fn into_one(self, id: QueryId) -> SelectorResult<Element> {
        match self {
            Self::One(element) => Ok(element),
            _ => Err(SelectorError::dispatch(id.name(), "expected a single element")),
        }
    }

    fn into_many(self, id: QueryId) -> SelectorResult<Vec<Element>> {
        match self {
            Self::Many(elements) => Ok(elements),
            _ => Err(SelectorError::dispatch(id.name(), "expected a list of elements")),
        }
    }

    fn into_maybe(self, id: QueryId) -> SelectorResult<Option<Element>> {
        match self {
            Self::Maybe(element) => Ok(element),
            _ => Err(SelectorError::dispatch(id.name(), "expected an optional element")),
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

/// By ARIA role
#[must_use]
pub fn by_role(role: impl Into<Matcher>) -> Selector {
    by_role_with(role, ByRoleOptions::default())
}

/// By ARIA role, with name and state filters
#[must_use]
pub fn by_role_with(role: impl Into<Matcher>, options: ByRoleOptions) -> Selector {
    Selector::new(Selection::Role {
        matcher: role.into(),
        options,
    })
}

/// By text content
#[must_use]
pub fn by_text(matcher: impl Into<Matcher>) -> Selector {
    by_text_with(matcher, SelectorMatcherOptions::default())
}

/// By text content, with options
#[must_use]
pub fn by_text_with(matcher: impl Into<Matcher>, options: SelectorMatcherOptions) -> Selector {
    Selector::new(Selection::Text {
        kind: TextQuery::Text,
        matcher: matcher.into(),
        options,
    })
}

/// By associated label text
#[must_use]
pub fn by_label_text(matcher: impl Into<Matcher>) -> Selector {
    by_label_text_with(matcher, SelectorMatcherOptions::default())
}

/// By associated label text, with options
#[must_use]
pub fn by_label_text_with(
    matcher: impl Into<Matcher>,
    options: SelectorMatcherOptions,
) -> Selector {
    Selector::new(Selection::Text {
        kind: TextQuery::LabelText,
        matcher: matcher.into(),
        options,
    })
}

/// By an attribute-like value
#[must_use]
pub fn by_bound_attribute(attribute: BoundAttribute, matcher: impl Into<Matcher>) -> Selector {
    by_bound_attribute_with(attribute, matcher, MatcherOptions::default())
}

/// By an attribute-like value, with options
#[must_use]
pub fn by_bound_attribute_with(
    attribute: BoundAttribute,
    matcher: impl Into<Matcher>,
    options: MatcherOptions,
) -> Selector {
    Selector::new(Selection::BoundAttribute {
        attribute,
        matcher: matcher.into(),
        options,
    })
}

macro_rules! attribute_builders {
    ($($attribute:ident => $plain:ident, $with:ident, $what:literal;)*) => {
        $(
            #[doc = concat!("By ", $what)]
            #[must_use]
            pub fn $plain(matcher: impl Into<Matcher>) -> Selector {
                by_bound_attribute(BoundAttribute::$attribute, matcher)
            }

            #[doc = concat!("By ", $what, ", with options")]
            #[must_use]
            pub fn $with(matcher: impl Into<Matcher>, options: MatcherOptions) -> Selector {
                by_bound_attribute_with(BoundAttribute::$attribute, matcher, options)
            }
        )*
    };
}

attribute_builders! {
    AltText => by_alt_text, by_alt_text_with, "`alt` attribute";
    DisplayValue => by_display_value, by_display_value_with, "form control value";
    TestId => by_test_id, by_test_id_with, "test-id attribute";
    PlaceholderText => by_placeholder_text, by_placeholder_text_with, "`placeholder` attribute";
    Title => by_title, by_title_with, "`title` attribute";
}
