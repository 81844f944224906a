use super::*;
use crate::schema::GuideConfig;

#[test]
fn test_validate_default_config() {
    let result = ConfigValidator::validate(&GuideConfig::default());
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_empty_automation_attribute() {
    let mut config = GuideConfig::default();
    config.executor.automation_attribute = "  ".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "executor.automation_attribute"));
}

#[test]
fn test_validate_fraction_out_of_range() {
    let mut config = GuideConfig::default();
    config.scroll.viewport_fraction = 1.5;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "scroll.viewport_fraction"));
}

#[test]
fn test_validate_zero_stable_frames() {
    let mut config = GuideConfig::default();
    config.scroll.stable_frames = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "scroll.stable_frames"));
}

#[test]
fn test_validate_short_timeout_warning() {
    let mut config = GuideConfig::default();
    config.scroll.settle_timeout_ms = 20;

    let result = ConfigValidator::validate(&config);
    assert!(result.is_valid());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.path == "scroll.settle_timeout_ms"));
}

#[test]
fn test_validate_zero_durations() {
    let mut config = GuideConfig::default();
    config.cursor.move_duration_ms = 0;
    config.highlight.trace_duration_ms = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "cursor.move_duration_ms"));
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "highlight.trace_duration_ms"));
}

#[test]
fn test_validate_inverted_pulse_range() {
    let mut config = GuideConfig::default();
    config.highlight.pulse_min_opacity = 0.9;
    config.highlight.pulse_max_opacity = 0.3;

    let result = ConfigValidator::validate(&config);
    assert!(!result.is_valid());
}

#[test]
fn test_validate_zero_max_iterations() {
    let mut config = GuideConfig::default();
    config.session.max_iterations = 0;

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "session.max_iterations"));
}

#[test]
fn test_validate_bad_urls() {
    let mut config = GuideConfig::default();
    config.session.analyze_url = "not a url".to_string();
    config.browser.cdp_endpoint = "ws://localhost:9222".to_string();

    let result = ConfigValidator::validate(&config);
    assert!(result.errors.iter().any(|e| e.path == "session.analyze_url"));
    assert!(result.errors.iter().any(|e| e.path == "browser.cdp_endpoint"));
}

#[test]
fn test_into_result() {
    let mut config = GuideConfig::default();
    config.session.max_iterations = 0;
    let err = ConfigValidator::validate(&config).into_result().unwrap_err();
    assert!(err.to_string().contains("session.max_iterations"));

    let warnings = ConfigValidator::validate(&GuideConfig::default())
        .into_result()
        .unwrap();
    assert!(warnings.is_empty());
}
