//! Scenario tests for selectors against rendered pages
//!
//! Each test renders its own fixture; the page is per-thread, so tests do
//! not share state.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::time::{Duration, Instant};

use domquery::logging::init_tracing;
use domquery::{cleanup, render, screen, ByRoleOptions, QueryError, WaitForOptions};
use domquery_selectors::{
    by_bound_attribute, by_label_text, by_role, by_role_with, by_test_id, by_text,
    BoundAttribute, SelectorError,
};

fn query_error(err: SelectorError) -> QueryError {
    match err {
        SelectorError::Query(err) => err,
        other => panic!("expected a provider error, got {other}"),
    }
}

// ============================================================================
// Single match
// ============================================================================

#[test]
fn test_get_submit_button_by_role_and_name() {
    init_tracing();
    render(r#"<form><input placeholder="Name"><button>Submit</button></form>"#).unwrap();

    let submit = by_role_with("button", ByRoleOptions::new().with_name("Submit"));
    let button = submit.get(None).unwrap();
    assert_eq!(button.tag_name(), "button");
    assert_eq!(button.text_content(), "Submit");

    assert_eq!(submit.query(None).unwrap(), Some(button.clone()));
    assert_eq!(submit.get_all(None).unwrap(), vec![button]);
    cleanup();
}

#[test]
fn test_selector_reruns_against_live_document() {
    render(r#"<div id="app"></div>"#).unwrap();
    let selector = by_role("button");
    assert!(selector.query(None).unwrap().is_none());

    let app = screen().unwrap().document().get_element_by_id("app").unwrap();
    app.set_inner_html("<button>Go</button>").unwrap();
    assert_eq!(selector.get(None).unwrap().text_content(), "Go");
    cleanup();
}

// ============================================================================
// No match
// ============================================================================

#[test]
fn test_missing_text() {
    render("<p>Present</p>").unwrap();
    let missing = by_text("Missing");

    let err = query_error(missing.get(None).unwrap_err());
    assert!(matches!(err, QueryError::NotFound { .. }));
    assert!(err
        .to_string()
        .starts_with("Unable to find an element with the text: Missing"));

    assert!(query_error(missing.get_all(None).unwrap_err()).is_not_found());
    assert!(missing.query(None).unwrap().is_none());
    assert!(missing.query_all(None).unwrap().is_empty());
    cleanup();
}

#[tokio::test]
async fn test_missing_text_find_times_out() {
    render("<p>Present</p>").unwrap();
    let wait = WaitForOptions::new().with_timeout(20);

    let err = query_error(by_text("Missing").find(None, Some(&wait)).await.unwrap_err());
    assert!(matches!(err, QueryError::Timeout { ms: 20, .. }));

    let err = query_error(
        by_text("Missing")
            .find_all(None, Some(&wait))
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, QueryError::Timeout { ms: 20, .. }));
    cleanup();
}

// ============================================================================
// Multiple matches
// ============================================================================

#[test]
fn test_duplicate_test_ids() {
    render(r#"<ul><li data-testid="item">a</li><li data-testid="item">b</li></ul>"#).unwrap();
    let items = by_test_id("item");

    let err = query_error(items.get(None).unwrap_err());
    assert!(matches!(err, QueryError::MultipleMatches { count: 2, .. }));
    assert!(err
        .to_string()
        .starts_with("Found multiple elements by: [data-testid=\"item\"]"));
    assert!(matches!(
        query_error(items.query(None).unwrap_err()),
        QueryError::MultipleMatches { .. }
    ));

    let all = items.get_all(None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].text_content(), "a");
    assert_eq!(all[1].text_content(), "b");
    assert_eq!(items.query_all(None).unwrap(), all);
    cleanup();
}

#[tokio::test]
async fn test_find_all_returns_every_match() {
    render(r#"<li data-testid="item">a</li><li data-testid="item">b</li>"#).unwrap();
    let all = by_test_id("item").find_all(None, None).await.unwrap();
    assert_eq!(all.len(), 2);
    cleanup();
}

// ============================================================================
// Waiting
// ============================================================================

#[tokio::test]
async fn test_late_insertion_within_timeout() {
    init_tracing();
    render(r#"<div id="app"></div>"#).unwrap();
    let app = screen().unwrap().document().get_element_by_id("app").unwrap();

    let insert = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.set_inner_html(r#"<p data-testid="late">late</p>"#).unwrap();
    };
    let wait = WaitForOptions::new().with_timeout(200);
    let selector = by_test_id("late");
    let (_, found) = tokio::join!(insert, selector.find(None, Some(&wait)));

    assert_eq!(found.unwrap().tag_name(), "p");
    cleanup();
}

#[tokio::test]
async fn test_late_insertion_after_timeout() {
    render(r#"<div id="app"></div>"#).unwrap();
    let app = screen().unwrap().document().get_element_by_id("app").unwrap();

    let insert = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.set_inner_html(r#"<p data-testid="late">late</p>"#).unwrap();
    };
    let wait = WaitForOptions::new().with_timeout(10);
    let selector = by_test_id("late");
    let (_, found) = tokio::join!(insert, selector.find(None, Some(&wait)));

    let err = query_error(found.unwrap_err());
    assert!(matches!(err, QueryError::Timeout { ms: 10, .. }));
    cleanup();
}

/// Insert a late element after 20 ms and report how long `find` took
async fn time_late_find(wait: &WaitForOptions) -> Duration {
    render(r#"<div id="app"></div>"#).unwrap();
    let app = screen().unwrap().document().get_element_by_id("app").unwrap();

    let insert = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.set_inner_html(r#"<p data-testid="late">late</p>"#).unwrap();
    };
    let selector = by_test_id("late");
    let started = Instant::now();
    let (_, found) = tokio::join!(insert, selector.find(None, Some(wait)));
    let elapsed = started.elapsed();

    assert_eq!(found.unwrap().tag_name(), "p");
    cleanup();
    elapsed
}

#[tokio::test]
async fn test_interval_reaches_wait_without_mutation_observer() {
    let wait = WaitForOptions::new()
        .with_timeout(2000)
        .with_interval(150)
        .with_observe_mutations(false);
    let elapsed = time_late_find(&wait).await;
    assert!(elapsed >= Duration::from_millis(150), "found after {elapsed:?}");
}

#[tokio::test]
async fn test_mutation_observer_wakes_before_interval() {
    let wait = WaitForOptions::new()
        .with_timeout(2000)
        .with_interval(1000)
        .with_observe_mutations(true);
    let elapsed = time_late_find(&wait).await;
    assert!(elapsed < Duration::from_millis(1000), "found after {elapsed:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spawned_find_needs_explicit_root() {
    let body = render(r#"<p data-testid="late">late</p>"#).unwrap().container();

    let scoped = tokio::spawn(async move { by_test_id("late").find(Some(&body), None).await });
    assert_eq!(scoped.await.unwrap().unwrap().tag_name(), "p");

    let unscoped = tokio::spawn(async { by_test_id("late").find(None, None).await });
    let err = query_error(unscoped.await.unwrap().unwrap_err());
    assert!(matches!(err, QueryError::NoPage));
    cleanup();
}

// ============================================================================
// Search root
// ============================================================================

#[test]
fn test_match_outside_root_is_excluded() {
    render(r#"<section id="a"><p>inside</p></section><p>outside</p>"#).unwrap();
    let section = screen().unwrap().document().get_element_by_id("a").unwrap();
    let outside = by_text("outside");

    assert!(outside.query(Some(&section)).unwrap().is_none());
    assert!(outside.query_all(Some(&section)).unwrap().is_empty());
    assert!(query_error(outside.get(Some(&section)).unwrap_err()).is_not_found());
    assert_eq!(outside.query(None).unwrap().unwrap().tag_name(), "p");
    cleanup();
}

#[test]
fn test_root_scopes_lookup() {
    render(
        r#"<section id="a"><p>hi</p></section><section id="b"><p>hi</p></section>"#,
    )
    .unwrap();
    let document = screen().unwrap().document().clone();
    let first = document.get_element_by_id("a").unwrap();
    let greeting = by_text("hi");

    assert_eq!(greeting.query_all(None).unwrap().len(), 2);
    let scoped = greeting.get(Some(&first)).unwrap();
    assert!(first.contains(&scoped));

    let second = document.get_element_by_id("b").unwrap();
    assert!(!second.contains(&scoped));
    cleanup();
}

#[test]
fn test_none_root_equals_screen() {
    render(r#"<label for="e">Email</label><input id="e">"#).unwrap();
    let body = screen().unwrap().container();
    let selector = by_label_text("Email");
    assert_eq!(
        selector.get(None).unwrap(),
        selector.get(Some(&body)).unwrap()
    );
    cleanup();
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn test_shorthand_and_bound_attribute_find_the_same_elements() {
    render(r#"<p data-testid="x">1</p><p data-testid="x">2</p>"#).unwrap();
    let shorthand = by_test_id("x").query_all(None).unwrap();
    let bound = by_bound_attribute(BoundAttribute::TestId, "x")
        .query_all(None)
        .unwrap();
    assert_eq!(shorthand, bound);
    cleanup();
}
