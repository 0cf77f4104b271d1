//! Wait mechanisms for asynchronous lookups.
//!
//! [`wait_for`] re-runs a lookup until it succeeds or the timeout elapses.
//! Attempts happen immediately, on every poll interval and, when
//! `observe_mutations` is on, whenever the document changes.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::config;
use crate::dom::Document;
use crate::result::{QueryError, QueryResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for `find_*` lookups and [`wait_for`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitForOptions {
    /// Timeout in milliseconds (`None` uses the configured async timeout)
    pub timeout_ms: Option<u64>,
    /// Polling interval in milliseconds
    pub interval_ms: u64,
    /// Also retry as soon as the document is mutated
    pub observe_mutations: bool,
}

impl Default for WaitForOptions {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            observe_mutations: true,
        }
    }
}

impl WaitForOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Enable or disable retrying on document mutations
    #[must_use]
    pub const fn with_observe_mutations(mut self, observe: bool) -> Self {
        self.observe_mutations = observe;
        self
    }

    /// Effective timeout, falling back to the active configuration
    #[must_use]
    pub fn resolved_timeout_ms(&self) -> u64 {
        self.timeout_ms
            .unwrap_or_else(|| config().async_util_timeout_ms)
    }

    /// Poll interval as a `Duration` (at least 1ms)
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

// =============================================================================
// WAIT LOOP
// =============================================================================

/// Retry `callback` until it succeeds or the timeout elapses.
///
/// Only not-found and multiple-match errors are retried; any other error is
/// returned at once. On timeout a pending multiple-match error is returned
/// unchanged, anything else becomes [`QueryError::Timeout`] carrying the
/// last attempt's message.
pub async fn wait_for<T, F>(
    document: &Document,
    options: Option<&WaitForOptions>,
    mut callback: F,
) -> QueryResult<T>
where
    F: FnMut() -> QueryResult<T>,
{
    let defaults = WaitForOptions::default();
    let options = options.unwrap_or(&defaults);
    let timeout_ms = options.resolved_timeout_ms();
    let interval = options.interval();
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut changes = options.observe_mutations.then(|| document.subscribe());

    let mut last = match callback() {
        Ok(value) => return Ok(value),
        Err(err) if err.is_retryable() => err,
        Err(err) => return Err(err),
    };
    debug!(timeout_ms, interval_ms = options.interval_ms, "waiting for lookup");

    let mut attempts = 1_u32;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        let nap = interval.min(deadline - now);
        let closed = match changes.as_mut() {
            Some(receiver) => tokio::select! {
                () = tokio::time::sleep(nap) => false,
                changed = receiver.changed() => changed.is_err(),
            },
            None => {
                tokio::time::sleep(nap).await;
                false
            }
        };
        if closed {
            changes = None;
        }

        attempts += 1;
        match callback() {
            Ok(value) => {
                debug!(attempts, "lookup succeeded while waiting");
                return Ok(value);
            }
            Err(err) if err.is_retryable() => last = err,
            Err(err) => return Err(err),
        }
    }

    debug!(attempts, timeout_ms, "lookup timed out");
    match last {
        err @ QueryError::MultipleMatches { .. } => Err(err),
        err => Err(QueryError::Timeout {
            ms: timeout_ms,
            message: err.to_string(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::queries::QueryKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn not_found() -> QueryError {
        QueryError::NotFound {
            kind: QueryKind::TestId,
            matcher: "late".to_string(),
            message: "Unable to find an element by: [data-testid=\"late\"]".to_string(),
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = WaitForOptions::default();
            assert_eq!(options.timeout_ms, None);
            assert_eq!(options.interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert!(options.observe_mutations);
            assert_eq!(options.resolved_timeout_ms(), 1_000);
        }

        #[test]
        fn test_builder() {
            let options = WaitForOptions::new()
                .with_timeout(10)
                .with_interval(0)
                .with_observe_mutations(false);
            assert_eq!(options.resolved_timeout_ms(), 10);
            assert_eq!(options.interval(), Duration::from_millis(1));
            assert!(!options.observe_mutations);
        }
    }

    mod wait_for_tests {
        use super::*;

        #[tokio::test]
        async fn test_immediate_success() {
            let document = Document::new();
            let value = wait_for(&document, None, || Ok::<_, QueryError>(7)).await.unwrap();
            assert_eq!(value, 7);
        }

        #[tokio::test]
        async fn test_times_out_with_last_message() {
            let document = Document::new();
            let options = WaitForOptions::new().with_timeout(20).with_interval(5);
            let err = wait_for(&document, Some(&options), || Err::<(), _>(not_found()))
                .await
                .unwrap_err();
            match err {
                QueryError::Timeout { ms, message } => {
                    assert_eq!(ms, 20);
                    assert!(message.contains("data-testid=\"late\""));
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_multiple_matches_survives_timeout() {
            let document = Document::new();
            let options = WaitForOptions::new().with_timeout(10);
            let err = wait_for(&document, Some(&options), || {
                Err::<(), _>(QueryError::MultipleMatches {
                    kind: QueryKind::TestId,
                    matcher: "item".to_string(),
                    count: 2,
                    message: "Found multiple elements by: [data-testid=\"item\"]".to_string(),
                })
            })
            .await
            .unwrap_err();
            assert!(matches!(err, QueryError::MultipleMatches { count: 2, .. }));
        }

        #[tokio::test]
        async fn test_non_lookup_error_stops_immediately() {
            let document = Document::new();
            let calls = AtomicU32::new(0);
            let err = wait_for(&document, None, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(QueryError::NoPage)
            })
            .await
            .unwrap_err();
            assert!(matches!(err, QueryError::NoPage));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_retries_until_success() {
            let document = Document::new();
            let calls = AtomicU32::new(0);
            let options = WaitForOptions::new().with_timeout(500).with_interval(1);
            let value = wait_for(&document, Some(&options), || {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(not_found())
                } else {
                    Ok("ready")
                }
            })
            .await
            .unwrap();
            assert_eq!(value, "ready");
            assert_eq!(calls.load(Ordering::SeqCst), 4);
        }

        #[tokio::test]
        async fn test_mutation_wakes_waiter_before_interval() {
            let document = Document::new();
            let body = document.body();
            let writer = document.clone();
            let options = WaitForOptions::new().with_timeout(2_000).with_interval(1_000);

            let waiter = wait_for(&document, Some(&options), || {
                if body.text_content() == "done" {
                    Ok(())
                } else {
                    Err(not_found())
                }
            });
            let mutate = async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                writer.body().append_text("done");
            };
            let started = Instant::now();
            let (result, ()) = tokio::join!(waiter, mutate);
            result.unwrap();
            assert!(started.elapsed() < Duration::from_millis(900));
        }
    }
}
