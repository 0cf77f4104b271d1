//! domquery: Testing-Library style DOM queries for Rust tests
//!
//! An in-memory DOM plus the query families test authors know from
//! Testing-Library: `get_by_role`, `query_all_by_text`,
//! `find_by_label_text`, and so on, for eight lookup strategies.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      DOMQUERY Architecture                      │
//! ├────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌─────────────────────┐  │
//! │   │ Fixture    │    │ Document   │    │ query_all_by_* x 8  │  │
//! │   │ HTML       │───►│ (arena,    │───►│ get/query/find x 6  │  │
//! │   │            │    │  watch)    │    │ (generated)         │  │
//! │   └────────────┘    └────────────┘    └─────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use domquery::prelude::*;
//!
//! let screen = render(r#"<button>Submit</button>"#)?;
//! let button = screen.get_by_role(&"button".into(), &ByRoleOptions::new().with_name("Submit"))?;
//! assert_eq!(button.text_content(), "Submit");
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod attributes;
mod css;
mod dom;
mod html;
mod result;
mod text;

/// Query configuration (test-id attribute, async timeout, error output)
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Tracing subscriber setup
pub mod logging;

/// Text matchers and matcher options
pub mod matcher;

/// DOM pretty-printing
pub mod pretty;

/// Query kinds and the generated query families
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
pub mod queries;

/// ARIA roles and accessible names
pub mod role;

/// Page document and `screen`
#[allow(clippy::missing_errors_doc)]
pub mod screen;

/// Wait Mechanisms
#[allow(clippy::missing_errors_doc)]
pub mod wait;

pub use config::{config, configure, set_config, QueryConfig};
pub use css::SelectorList;
pub use dom::{Document, Element, NodeId};
pub use matcher::{
    IgnoreRule, Matcher, MatcherFn, MatcherOptions, Normalizer, SelectorMatcherOptions,
};
pub use pretty::pretty_dom;
pub use queries::*;
pub use result::{QueryError, QueryResult};
pub use role::{compute_accessible_name, ByRoleOptions};
pub use screen::{cleanup, mount, render, screen, Screen};
pub use wait::{wait_for, WaitForOptions, DEFAULT_POLL_INTERVAL_MS};

/// Everything a test usually needs
pub mod prelude {
    pub use super::config::{config, configure, set_config, QueryConfig};
    pub use super::dom::{Document, Element};
    pub use super::matcher::{IgnoreRule, Matcher, MatcherOptions, SelectorMatcherOptions};
    pub use super::queries::*;
    pub use super::result::{QueryError, QueryResult};
    pub use super::role::ByRoleOptions;
    pub use super::screen::{cleanup, mount, render, screen, Screen};
    pub use super::wait::{wait_for, WaitForOptions};
}
