//! Tests for error module

use crowdtrack::error::{CrowdError, OptionExt};

#[test]
fn test_error_display() {
    let err = CrowdError::InsufficientData {
        stage: "rasterization",
        reason: "track has 1 points, at least 2 required".to_string(),
    };
    assert!(err.to_string().contains("rasterization"));
    assert!(err.to_string().contains("1 points"));
}

#[test]
fn test_option_ext() {
    let none: Option<i32> = None;
    let result = none.ok_or_insufficient_data("movement model", "no displacements");
    assert!(matches!(result, Err(CrowdError::InsufficientData { .. })));
}

#[test]
fn test_only_contingency_errors_are_recoverable() {
    let degenerate = CrowdError::DegenerateContingencyTable {
        reason: "row 0 is all zero".to_string(),
    };
    let fatal = CrowdError::InvalidConfig {
        field: "k",
        reason: "must be at least 1".to_string(),
    };
    assert!(degenerate.is_recoverable());
    assert!(!fatal.is_recoverable());
}
