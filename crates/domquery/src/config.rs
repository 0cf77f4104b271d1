//! Query configuration.
//!
//! The active [`QueryConfig`] is per thread, the way Testing-Library keeps
//! one configuration per realm. Tests that run on separate threads can
//! reconfigure freely without seeing each other's settings.

use std::cell::RefCell;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::result::{QueryError, QueryResult};

/// Default attribute used by `*_by_test_id`
pub const DEFAULT_TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Default timeout for `find_*` lookups (1 second)
pub const DEFAULT_ASYNC_TIMEOUT_MS: u64 = 1_000;

/// Default number of characters of DOM printed into error messages
pub const DEFAULT_DOM_PRINT_LIMIT: usize = 7_000;

/// Configuration shared by every query on the current thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Attribute read by the test-id queries
    pub test_id_attribute: String,
    /// Default `find_*` timeout in milliseconds
    pub async_util_timeout_ms: u64,
    /// Whether role queries include inaccessible elements by default
    pub default_hidden: bool,
    /// Selector list skipped by text queries unless overridden
    pub default_ignore: String,
    /// Append a pretty-printed DOM to not-found and multiple-match errors
    pub include_dom_in_errors: bool,
    /// Maximum characters of DOM printed into errors
    pub dom_print_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            test_id_attribute: DEFAULT_TEST_ID_ATTRIBUTE.to_string(),
            async_util_timeout_ms: DEFAULT_ASYNC_TIMEOUT_MS,
            default_hidden: false,
            default_ignore: "script, style".to_string(),
            include_dom_in_errors: true,
            dom_print_limit: DEFAULT_DOM_PRINT_LIMIT,
        }
    }
}

impl QueryConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the test-id attribute
    #[must_use]
    pub fn with_test_id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.test_id_attribute = attribute.into();
        self
    }

    /// Set the default async timeout
    #[must_use]
    pub const fn with_async_util_timeout(mut self, timeout_ms: u64) -> Self {
        self.async_util_timeout_ms = timeout_ms;
        self
    }

    /// Include inaccessible elements in role queries by default
    #[must_use]
    pub const fn with_default_hidden(mut self, hidden: bool) -> Self {
        self.default_hidden = hidden;
        self
    }

    /// Set the default ignore selector for text queries
    #[must_use]
    pub fn with_default_ignore(mut self, selector: impl Into<String>) -> Self {
        self.default_ignore = selector.into();
        self
    }

    /// Enable or disable DOM snapshots in error messages
    #[must_use]
    pub const fn with_dom_in_errors(mut self, enabled: bool) -> Self {
        self.include_dom_in_errors = enabled;
        self
    }

    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> QueryResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Parse from JSON
    pub fn from_json_str(json: &str) -> QueryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(QueryError::Config {
                message: format!(
                    "unsupported config extension {:?} for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }

    /// Apply `DOMQUERY_*` and `DEBUG_PRINT_LIMIT` environment overrides
    pub fn with_env_overrides(self) -> QueryResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> QueryResult<Self> {
        if let Some(attribute) = var("DOMQUERY_TEST_ID_ATTRIBUTE") {
            self.test_id_attribute = attribute;
        }
        if let Some(timeout) = var("DOMQUERY_ASYNC_TIMEOUT_MS") {
            self.async_util_timeout_ms = parse_env("DOMQUERY_ASYNC_TIMEOUT_MS", &timeout)?;
        }
        if let Some(hidden) = var("DOMQUERY_DEFAULT_HIDDEN") {
            self.default_hidden = parse_env("DOMQUERY_DEFAULT_HIDDEN", &hidden)?;
        }
        if let Some(limit) = var("DEBUG_PRINT_LIMIT") {
            self.dom_print_limit = parse_env("DEBUG_PRINT_LIMIT", &limit)?;
        }
        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> QueryResult<T> {
    value.trim().parse().map_err(|_| QueryError::Config {
        message: format!("invalid value for {key}: {value:?}"),
    })
}

thread_local! {
    static ACTIVE: RefCell<QueryConfig> = RefCell::new(QueryConfig::default());
}

/// Snapshot of the active configuration
#[must_use]
pub fn config() -> QueryConfig {
    ACTIVE.with(|active| active.borrow().clone())
}

/// Replace the active configuration
pub fn set_config(config: QueryConfig) {
    ACTIVE.with(|active| *active.borrow_mut() = config);
}

/// Update the active configuration in place
pub fn configure(update: impl FnOnce(&mut QueryConfig)) {
    ACTIVE.with(|active| update(&mut active.borrow_mut()));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = QueryConfig::default();
            assert_eq!(config.test_id_attribute, "data-testid");
            assert_eq!(config.async_util_timeout_ms, 1_000);
            assert!(!config.default_hidden);
            assert_eq!(config.default_ignore, "script, style");
            assert!(config.include_dom_in_errors);
        }

        #[test]
        fn test_builder() {
            let config = QueryConfig::new()
                .with_test_id_attribute("data-test")
                .with_async_util_timeout(250)
                .with_dom_in_errors(false);
            assert_eq!(config.test_id_attribute, "data-test");
            assert_eq!(config.async_util_timeout_ms, 250);
            assert!(!config.include_dom_in_errors);
        }
    }

    mod loading_tests {
        use super::*;

        #[test]
        fn test_yaml_partial_uses_defaults() {
            let config = QueryConfig::from_yaml_str("test_id_attribute: data-qa\n").unwrap();
            assert_eq!(config.test_id_attribute, "data-qa");
            assert_eq!(config.async_util_timeout_ms, DEFAULT_ASYNC_TIMEOUT_MS);
        }

        #[test]
        fn test_json() {
            let config =
                QueryConfig::from_json_str(r#"{"async_util_timeout_ms": 20, "default_hidden": true}"#)
                    .unwrap();
            assert_eq!(config.async_util_timeout_ms, 20);
            assert!(config.default_hidden);
        }

        #[test]
        fn test_from_file_by_extension() {
            let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
            writeln!(file, "dom_print_limit: 10").unwrap();
            let config = QueryConfig::from_file(file.path()).unwrap();
            assert_eq!(config.dom_print_limit, 10);
        }

        #[test]
        fn test_from_file_rejects_unknown_extension() {
            let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            assert!(matches!(
                QueryConfig::from_file(file.path()),
                Err(QueryError::Config { .. })
            ));
        }

        #[test]
        fn test_invalid_yaml() {
            assert!(matches!(
                QueryConfig::from_yaml_str("async_util_timeout_ms: [1"),
                Err(QueryError::Yaml(_))
            ));
        }
    }

    mod env_tests {
        use super::*;

        fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            move |key| map.get(key).cloned()
        }

        #[test]
        fn test_overrides() {
            let config = QueryConfig::default()
                .with_overrides_from(vars(&[
                    ("DOMQUERY_TEST_ID_ATTRIBUTE", "data-cy"),
                    ("DOMQUERY_ASYNC_TIMEOUT_MS", "75"),
                    ("DOMQUERY_DEFAULT_HIDDEN", "true"),
                    ("DEBUG_PRINT_LIMIT", "300"),
                ]))
                .unwrap();
            assert_eq!(config.test_id_attribute, "data-cy");
            assert_eq!(config.async_util_timeout_ms, 75);
            assert!(config.default_hidden);
            assert_eq!(config.dom_print_limit, 300);
        }

        #[test]
        fn test_invalid_override() {
            let result = QueryConfig::default()
                .with_overrides_from(vars(&[("DOMQUERY_ASYNC_TIMEOUT_MS", "soon")]));
            assert!(matches!(result, Err(QueryError::Config { .. })));
        }
    }

    mod active_tests {
        use super::*;

        #[test]
        fn test_configure_is_thread_local() {
            configure(|config| config.test_id_attribute = "data-local".to_string());
            assert_eq!(config().test_id_attribute, "data-local");
            let other = std::thread::spawn(|| config().test_id_attribute)
                .join()
                .unwrap();
            assert_eq!(other, "data-testid");
            set_config(QueryConfig::default());
            assert_eq!(config().test_id_attribute, "data-testid");
        }
    }
}
