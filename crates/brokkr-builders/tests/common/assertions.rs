//! Assertion helpers for resolution testing

use brokkr_core::AggregateError;

/// Assert that some error message contains `expected`
pub fn assert_mentions(err: &AggregateError, expected: &str) {
    assert!(
        err.mentions(expected),
        "No error mentions expected content.\nExpected: {}\nErrors:\n{}",
        expected,
        err
    );
}

/// Assert that errors were reported by exactly these components, in order
pub fn assert_components(err: &AggregateError, expected: &[&str]) {
    let mut seen: Vec<&str> = Vec::new();
    for e in err.errors() {
        if !seen.contains(&e.component.as_str()) {
            seen.push(&e.component);
        }
    }
    assert_eq!(seen, expected, "Unexpected components in:\n{}", err);
}
