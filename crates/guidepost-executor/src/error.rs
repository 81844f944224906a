//! Error types for locating targets and driving workflow runs.

use std::fmt;

use guidepost_protocols::{OverlayError, PageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a lookup came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// No strategy matched a live node.
    NoMatch,
    /// A node matched but occupies no screen space.
    ZeroSize { selector: String },
    /// A node matched but left the document before it could be measured.
    Detached { selector: String },
    EmptyIdentifier,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoMatch => f.write_str("no strategy matched"),
            NotFoundReason::ZeroSize { selector } => {
                write!(f, "{} matched an element with zero size", selector)
            }
            NotFoundReason::Detached { selector } => {
                write!(f, "{} matched an element that was detached", selector)
            }
            NotFoundReason::EmptyIdentifier => f.write_str("identifier is empty"),
        }
    }
}

/// Errors from the element locator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocateError {
    /// Unresolved, or resolved to something not visually present.
    #[error("Element '{identifier}' not found: {reason} (tried {})", .attempted.join(", "))]
    NotFound {
        identifier: String,
        attempted: Vec<String>,
        reason: NotFoundReason,
    },

    /// The page itself could not be queried.
    #[error("Page error while locating: {0}")]
    Page(#[from] PageError),
}

/// Errors from the workflow executor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutorError {
    /// Another run is driving the overlays.
    #[error("A workflow run is already active, cannot start '{0}'")]
    Busy(String),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Page error: {0}")]
    Page(#[from] PageError),

    /// Both the page listeners and the control channel went away.
    #[error("Interaction signals closed before the run finished")]
    SignalsClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_attempted_selectors() {
        let err = LocateError::NotFound {
            identifier: "buy".to_string(),
            attempted: vec!["#buy".to_string(), "[name=\"buy\"]".to_string()],
            reason: NotFoundReason::NoMatch,
        };
        let display = err.to_string();
        assert!(display.contains("'buy'"));
        assert!(display.contains("#buy, [name=\"buy\"]"));
        assert!(display.contains("no strategy matched"));
    }

    #[test]
    fn test_zero_size_reason() {
        let reason = NotFoundReason::ZeroSize {
            selector: "#ghost".to_string(),
        };
        assert!(reason.to_string().contains("zero size"));
        assert!(reason.to_string().contains("#ghost"));
    }

    #[test]
    fn test_busy_error() {
        let err = ExecutorError::Busy("checkout".to_string());
        assert!(err.to_string().contains("already active"));
        assert!(err.to_string().contains("checkout"));
    }

    #[test]
    fn test_locate_error_is_transparent() {
        let err: ExecutorError = LocateError::NotFound {
            identifier: "x".to_string(),
            attempted: vec![],
            reason: NotFoundReason::EmptyIdentifier,
        }
        .into();
        assert!(err.to_string().starts_with("Element 'x' not found"));
    }

    #[test]
    fn test_overlay_error_from() {
        let err: ExecutorError = OverlayError::Destroyed.into();
        assert!(err.to_string().contains("destroyed"));
    }

    #[test]
    fn test_reason_serializes_tagged() {
        let json = serde_json::to_value(NotFoundReason::ZeroSize {
            selector: "#a".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "zero_size");
        assert_eq!(json["selector"], "#a");
    }
}
