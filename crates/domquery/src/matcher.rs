//! Text matchers and matcher options.
//!
//! A [`Matcher`] decides whether the text extracted from an element (its
//! own text, a label, an attribute value, ...) counts as a match. Text is
//! normalized before matching: by default leading/trailing whitespace is
//! trimmed and runs of whitespace collapse to a single space.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::dom::Element;
use crate::result::QueryResult;

/// Custom text normalizer, replacing the default trim/collapse behavior
pub type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Predicate matcher: receives the normalized text and the candidate element
pub type MatcherFn = Arc<dyn Fn(&str, &Element) -> bool + Send + Sync>;

/// What text counts as a match
#[derive(Clone)]
pub enum Matcher {
    /// Literal text (exact or, with `exact: false`, case-insensitive substring)
    Str(String),
    /// Regular expression, unanchored
    Regex(Regex),
    /// Arbitrary predicate
    Predicate(MatcherFn),
}

impl Matcher {
    /// Compile a regex matcher
    pub fn regex(pattern: &str) -> QueryResult<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Wrap a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &Element) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Match already-normalized text
    pub(crate) fn matches_normalized(&self, text: &str, element: &Element, exact: bool) -> bool {
        match self {
            Self::Str(expected) if exact => text == expected,
            Self::Str(expected) => text.to_lowercase().contains(&expected.to_lowercase()),
            Self::Regex(regex) => regex.is_match(text),
            Self::Predicate(f) => f(text, element),
        }
    }

    /// Normalize `text` with `options`, then match
    pub fn matches(&self, text: &str, element: &Element, options: &MatcherOptions) -> bool {
        self.matches_normalized(&options.normalize(text), element, options.exact)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => f.debug_tuple("Str").field(text).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => f.write_str(text),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            Self::Predicate(_) => f.write_str("[predicate]"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(text: &str) -> Self {
        Self::Str(text.to_string())
    }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

impl From<&String> for Matcher {
    fn from(text: &String) -> Self {
        Self::Str(text.clone())
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

/// Options shared by every text-based query
#[derive(Clone)]
pub struct MatcherOptions {
    /// Exact, case-sensitive match when `true`
    pub exact: bool,
    /// Trim leading/trailing whitespace (default normalizer only)
    pub trim: bool,
    /// Collapse whitespace runs (default normalizer only)
    pub collapse_whitespace: bool,
    /// Replaces the default normalizer entirely
    pub normalizer: Option<Normalizer>,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            exact: true,
            trim: true,
            collapse_whitespace: true,
            normalizer: None,
        }
    }
}

impl fmt::Debug for MatcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherOptions")
            .field("exact", &self.exact)
            .field("trim", &self.trim)
            .field("collapse_whitespace", &self.collapse_whitespace)
            .field("normalizer", &self.normalizer.as_ref().map(|_| ".."))
            .finish()
    }
}

impl MatcherOptions {
    /// Default options (exact, trimmed, collapsed)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set exact matching
    #[must_use]
    pub const fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Set trimming for the default normalizer
    #[must_use]
    pub const fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Set whitespace collapsing for the default normalizer
    #[must_use]
    pub const fn with_collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    /// Use a custom normalizer
    #[must_use]
    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Normalize text according to these options
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        if let Some(normalizer) = &self.normalizer {
            return normalizer(text);
        }
        default_normalize(text, self.trim, self.collapse_whitespace)
    }
}

/// Trim and/or collapse whitespace
#[must_use]
pub fn default_normalize(text: &str, trim: bool, collapse_whitespace: bool) -> String {
    let text = if trim { text.trim() } else { text };
    if collapse_whitespace {
        let mut out = String::with_capacity(text.len());
        let mut in_space = false;
        for c in text.chars() {
            if c.is_whitespace() {
                if !in_space {
                    out.push(' ');
                }
                in_space = true;
            } else {
                out.push(c);
                in_space = false;
            }
        }
        out
    } else {
        text.to_string()
    }
}

/// Which elements text queries skip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IgnoreRule {
    /// Use the configured `default_ignore` (`script, style` by default)
    #[default]
    Configured,
    /// Ignore nothing
    Disabled,
    /// Ignore elements matching this selector list
    Selector(String),
}

/// Matcher options plus the candidate selector, for text and label queries
#[derive(Debug, Clone)]
pub struct SelectorMatcherOptions {
    /// Text matching options
    pub base: MatcherOptions,
    /// Only elements matching this selector list are candidates
    pub selector: String,
    /// Elements skipped by text queries
    pub ignore: IgnoreRule,
}

impl Default for SelectorMatcherOptions {
    fn default() -> Self {
        Self {
            base: MatcherOptions::default(),
            selector: "*".to_string(),
            ignore: IgnoreRule::Configured,
        }
    }
}

impl From<MatcherOptions> for SelectorMatcherOptions {
    fn from(base: MatcherOptions) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }
}

impl SelectorMatcherOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set exact matching
    #[must_use]
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.base.exact = exact;
        self
    }

    /// Restrict candidates to a selector list
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Set the ignore rule
    #[must_use]
    pub fn with_ignore(mut self, ignore: IgnoreRule) -> Self {
        self.ignore = ignore;
        self
    }

    /// Use a custom normalizer
    #[must_use]
    pub fn with_normalizer<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.base = self.base.with_normalizer(normalizer);
        self
    }
}
