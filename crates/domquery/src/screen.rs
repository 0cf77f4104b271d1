//! The page document and `screen`.
//!
//! A test renders its fixture into the page for the current thread;
//! [`screen()`] then exposes every query bound to the page body. The
//! query methods on [`Screen`] are generated next to the free functions in
//! [`crate::queries`].

use std::cell::RefCell;

use tracing::debug;

use crate::config::config;
use crate::dom::{Document, Element};
use crate::pretty::pretty_dom;
use crate::result::{QueryError, QueryResult};

thread_local! {
    static PAGE: RefCell<Option<Document>> = const { RefCell::new(None) };
}

/// Queries bound to the mounted page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    document: Document,
}

impl Screen {
    /// The page document
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The element every screen query searches (the page `<body>`)
    #[must_use]
    pub fn container(&self) -> Element {
        self.document.body()
    }

    /// Pretty-printed page body, truncated to the configured print limit
    #[must_use]
    pub fn debug(&self) -> String {
        pretty_dom(&self.container(), config().dom_print_limit)
    }
}

/// Mount a document as the page for this thread, replacing any previous one
pub fn mount(document: Document) -> Screen {
    debug!("mounting page document");
    PAGE.with(|page| *page.borrow_mut() = Some(document.clone()));
    Screen { document }
}

/// Parse `html` into a fresh page document and mount it
pub fn render(html: &str) -> QueryResult<Screen> {
    Ok(mount(Document::from_html(html)?))
}

/// Unmount the page document
pub fn cleanup() {
    PAGE.with(|page| page.borrow_mut().take());
}

/// Queries bound to the current page, or `NoPage` when nothing is mounted
pub fn screen() -> QueryResult<Screen> {
    PAGE.with(|page| page.borrow().clone())
        .map(|document| Screen { document })
        .ok_or(QueryError::NoPage)
}
