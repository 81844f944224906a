use super::*;

#[test]
fn test_page_error_invalid_selector() {
    let err = PageError::InvalidSelector("#1bad".to_string());
    assert!(err.to_string().contains("Invalid selector"));
    assert!(err.to_string().contains("#1bad"));
}

#[test]
fn test_page_error_detached() {
    let err = PageError::Detached("node-3".to_string());
    assert!(err.to_string().contains("detached"));
}

#[test]
fn test_page_error_disconnected() {
    let err = PageError::Disconnected("socket closed".to_string());
    assert!(err.to_string().contains("disconnected"));
    assert!(err.to_string().contains("socket closed"));
}

#[test]
fn test_overlay_error_destroyed() {
    let err = OverlayError::Destroyed;
    assert!(err.to_string().contains("destroyed"));
}

#[test]
fn test_overlay_error_surface() {
    let err = OverlayError::Surface("canvas missing".to_string());
    assert!(err.to_string().contains("Surface error"));
    assert!(err.to_string().contains("canvas missing"));
}
