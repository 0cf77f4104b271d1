//! domquery-selectors: lazily-dispatched selectors over domquery
//!
//! Build a selector once with `by_role`, `by_text`, `by_label_text`,
//! `by_bound_attribute` or one of its shorthands. Then call any of six
//! operations on it:
//!
//! | Operation   | Cardinality | Timing | No match     |
//! |-------------|-------------|--------|--------------|
//! | `get`       | one         | sync   | error        |
//! | `get_all`   | many        | sync   | error        |
//! | `find`      | one         | async  | error (wait) |
//! | `find_all`  | many        | async  | error (wait) |
//! | `query`     | one         | sync   | `None`       |
//! | `query_all` | many        | sync   | empty        |
//!
//! Each call resolves an identifier such as `findByRole` in a dispatch
//! table and runs the matching `domquery` function. Provider errors come
//! back unchanged.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   by_* builders ──► Selection ──► Strategy                    │
//! │                                      │                        │
//! │   Operation ─────────────────────► QueryId ("findByRole")     │
//! │                                      │                        │
//! │                 QueryTable (48, OnceLock) ──► domquery::*     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use domquery_selectors::prelude::*;
//!
//! domquery_selectors::init()?;
//! render(r#"<button>Submit</button>"#)?;
//! let button = by_role_with("button", ByRoleOptions::new().with_name("Submit")).get(None)?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Operations, strategies and the dispatch table
pub mod dispatch;

mod result;

/// Selection descriptors
pub mod selection;

/// Selectors and builders
#[allow(clippy::missing_errors_doc)]
pub mod selector;

pub use dispatch::{dispatch_table, Operation, QueryId, QueryTable, Strategy, QUERY_COUNT};
pub use result::{SelectorError, SelectorResult};
pub use selection::{BoundAttribute, Selection, TextQuery};
pub use selector::{
    by_alt_text, by_alt_text_with, by_bound_attribute, by_bound_attribute_with,
    by_display_value, by_display_value_with, by_label_text, by_label_text_with,
    by_placeholder_text, by_placeholder_text_with, by_role, by_role_with, by_test_id,
    by_test_id_with, by_text, by_text_with, by_title, by_title_with, Selector,
};

/// Build and validate the dispatch table now.
///
/// Every operation does this lazily; calling it at startup surfaces an
/// incomplete table before the first lookup.
///
/// # Errors
///
/// Returns [`SelectorError::Dispatch`] naming the first identifier that is
/// missing, duplicated or bound with the wrong shape.
pub fn init() -> SelectorResult<()> {
    dispatch_table().map(|_| ())
}

/// Everything a test usually needs
pub mod prelude {
    pub use super::{
        by_alt_text, by_alt_text_with, by_bound_attribute, by_bound_attribute_with,
        by_display_value, by_display_value_with, by_label_text, by_label_text_with,
        by_placeholder_text, by_placeholder_text_with, by_role, by_role_with, by_test_id,
        by_test_id_with, by_text, by_text_with, by_title, by_title_with, BoundAttribute,
        Operation, Selector, SelectorError, SelectorResult,
    };
    pub use domquery::prelude::*;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_init_succeeds() {
        init().unwrap();
        assert_eq!(dispatch_table().unwrap().len(), QUERY_COUNT);
    }
}
