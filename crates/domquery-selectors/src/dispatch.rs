//! Dispatch table from query identifiers to provider functions.
//!
//! A query identifier is an operation prefix plus a strategy suffix:
//! `get` + `ByRole` = `getByRole`. The bindings behind the 48 identifiers
//! are generated by the `QueryBindings` derive on [`Strategy`]; the table is
//! built and validated once per process.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use domquery::{
    ByRoleOptions, Element, Matcher, MatcherOptions, QueryResult, SelectorMatcherOptions,
    WaitForOptions,
};
use domquery_derive::QueryBindings;
use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::result::{SelectorError, SelectorResult};

// ============================================================================
// Operations and strategies
// ============================================================================

/// The six retrieval operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Exactly one match, synchronously
    Get,
    /// At least one match, synchronously
    GetAll,
    /// Exactly one match, waiting for it
    Find,
    /// At least one match, waiting for it
    FindAll,
    /// Zero or one match
    Query,
    /// Any number of matches
    QueryAll,
}

impl Operation {
    /// Every operation
    pub const ALL: [Self; 6] = [
        Self::Get,
        Self::GetAll,
        Self::Find,
        Self::FindAll,
        Self::Query,
        Self::QueryAll,
    ];

    /// Identifier prefix
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::Find => "find",
            Self::FindAll => "findAll",
            Self::Query => "query",
            Self::QueryAll => "queryAll",
        }
    }

    /// Whether the operation waits (and returns a future)
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Find | Self::FindAll)
    }
}

/// Lookup strategy of a selection.
///
/// `ALL`, `name()`, `suffix()` and the dispatch bindings are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QueryBindings)]
pub enum Strategy {
    /// ARIA role
    #[bind(options = ByRoleOptions)]
    Role,
    /// Text content
    #[bind(options = SelectorMatcherOptions)]
    Text,
    /// Associated label text
    #[bind(options = SelectorMatcherOptions)]
    LabelText,
    /// `alt` attribute
    #[bind(options = MatcherOptions)]
    AltText,
    /// Form control value
    #[bind(options = MatcherOptions)]
    DisplayValue,
    /// Test-id attribute
    #[bind(options = MatcherOptions)]
    TestId,
    /// `placeholder` attribute
    #[bind(options = MatcherOptions)]
    PlaceholderText,
    /// `title` attribute
    #[bind(options = MatcherOptions)]
    Title,
}

/// An (operation, strategy) pair, rendered as the provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId {
    /// Operation prefix
    pub operation: Operation,
    /// Strategy suffix
    pub strategy: Strategy,
}

impl QueryId {
    /// Pair an operation with a strategy
    #[must_use]
    pub const fn new(operation: Operation, strategy: Strategy) -> Self {
        Self {
            operation,
            strategy,
        }
    }

    /// Identifier, e.g. `queryAllByTestId`
    #[must_use]
    pub fn name(self) -> String {
        format!("{}{}", self.operation.prefix(), self.strategy.suffix())
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation.prefix())?;
        f.write_str(self.strategy.suffix())
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// What a provider function returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Found {
    /// `get` / `find`
    One(Element),
    /// `get_all` / `find_all` / `query_all`
    Many(Vec<Element>),
    /// `query`
    Maybe(Option<Element>),
}

/// Synchronous provider function
pub type SyncLookup<O> = fn(&Element, &Matcher, &O) -> QueryResult<Found>;

/// Asynchronous provider function
pub type AsyncLookup<O> = for<'a> fn(
    &'a Element,
    &'a Matcher,
    &'a O,
    Option<&'a WaitForOptions>,
) -> BoxFuture<'a, QueryResult<Found>>;

/// A provider function for one options type
pub enum Lookup<O> {
    /// `get`, `get_all`, `query`, `query_all`
    Sync(SyncLookup<O>),
    /// `find`, `find_all`
    Async(AsyncLookup<O>),
}

impl<O> Clone for Lookup<O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for Lookup<O> {}

impl<O> fmt::Debug for Lookup<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Lookup::Sync"),
            Self::Async(_) => f.write_str("Lookup::Async"),
        }
    }
}

impl<O> Lookup<O> {
    /// Whether this lookup returns a future
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

/// A provider function, tagged by the options type it takes
#[derive(Debug, Clone, Copy)]
pub enum Binding {
    /// Takes [`ByRoleOptions`]
    Role(Lookup<ByRoleOptions>),
    /// Takes [`SelectorMatcherOptions`]
    Text(Lookup<SelectorMatcherOptions>),
    /// Takes [`MatcherOptions`]
    Attribute(Lookup<MatcherOptions>),
}

impl Binding {
    /// Whether the bound function returns a future
    #[must_use]
    pub const fn is_async(&self) -> bool {
        match self {
            Self::Role(lookup) => lookup.is_async(),
            Self::Text(lookup) => lookup.is_async(),
            Self::Attribute(lookup) => lookup.is_async(),
        }
    }

    /// Whether this binding takes the options type `strategy` queries with
    #[must_use]
    pub const fn fits(&self, strategy: Strategy) -> bool {
        matches!(
            (self, strategy),
            (Self::Role(_), Strategy::Role)
                | (Self::Text(_), Strategy::Text | Strategy::LabelText)
                | (
                    Self::Attribute(_),
                    Strategy::AltText
                        | Strategy::DisplayValue
                        | Strategy::TestId
                        | Strategy::PlaceholderText
                        | Strategy::Title
                )
        )
    }
}

/// Options types a [`Lookup`] can be bound for
pub trait IntoBinding: Sized {
    /// Tag the lookup with its options type
    fn into_binding(lookup: Lookup<Self>) -> Binding;
}

impl IntoBinding for ByRoleOptions {
    fn into_binding(lookup: Lookup<Self>) -> Binding {
        Binding::Role(lookup)
    }
}

impl IntoBinding for SelectorMatcherOptions {
    fn into_binding(lookup: Lookup<Self>) -> Binding {
        Binding::Text(lookup)
    }
}

impl IntoBinding for MatcherOptions {
    fn into_binding(lookup: Lookup<Self>) -> Binding {
        Binding::Attribute(lookup)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Number of identifiers: six operations times eight strategies
pub const QUERY_COUNT: usize = Operation::ALL.len() * Strategy::ALL.len();

/// Validated identifier -> binding map
#[derive(Debug)]
pub struct QueryTable {
    bindings: HashMap<String, Binding>,
}

impl QueryTable {
    /// Build the table from the generated bindings and validate it
    pub fn build() -> SelectorResult<Self> {
        Self::from_bindings(Strategy::bindings())
    }

    fn from_bindings(entries: Vec<(QueryId, Binding)>) -> SelectorResult<Self> {
        let mut bindings = HashMap::with_capacity(entries.len());
        for (id, binding) in entries {
            if binding.is_async() != id.operation.is_async() {
                return Err(SelectorError::dispatch(
                    id.name(),
                    "call shape disagrees with operation",
                ));
            }
            if !binding.fits(id.strategy) {
                return Err(SelectorError::dispatch(
                    id.name(),
                    "options type disagrees with strategy",
                ));
            }
            if bindings.insert(id.name(), binding).is_some() {
                return Err(SelectorError::dispatch(id.name(), "bound twice"));
            }
        }

        for operation in Operation::ALL {
            for strategy in Strategy::ALL {
                let id = QueryId::new(operation, strategy);
                if !bindings.contains_key(&id.name()) {
                    return Err(SelectorError::dispatch(id.name(), "not bound"));
                }
            }
        }

        debug!(queries = bindings.len(), "dispatch table ready");
        Ok(Self { bindings })
    }

    /// Binding for `id`
    pub fn binding(&self, id: QueryId) -> SelectorResult<Binding> {
        self.get(&id.name())
            .ok_or_else(|| SelectorError::dispatch(id.name(), "not bound"))
    }

    /// Binding for an identifier such as `"findAllByTitle"`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.bindings.get(name).copied()
    }

    /// Bound identifiers, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of bound identifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Cached validation failure
#[derive(Debug, Clone)]
struct DispatchFailure {
    query: String,
    reason: String,
}

static TABLE: OnceLock<Result<QueryTable, DispatchFailure>> = OnceLock::new();

/// The process-wide dispatch table, built and validated on first use.
///
/// A validation failure is cached and returned on every call.
pub fn dispatch_table() -> SelectorResult<&'static QueryTable> {
    let table = TABLE.get_or_init(|| {
        QueryTable::build().map_err(|err| {
            error!(%err, "dispatch table is invalid");
            match err {
                SelectorError::Dispatch { query, reason } => DispatchFailure { query, reason },
                SelectorError::Query(err) => DispatchFailure {
                    query: String::new(),
                    reason: err.to_string(),
                },
            }
        })
    });
    match table {
        Ok(table) => Ok(table),
        Err(failure) => Err(SelectorError::dispatch(
            failure.query.clone(),
            failure.reason.clone(),
        )),
    }
}
