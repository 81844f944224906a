//! Error types for the page and overlay ports.

use thiserror::Error;

/// Errors raised by a [`Page`](crate::Page) implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    /// The selector could not be parsed by the document.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The node is no longer attached to the document.
    #[error("Node detached: {0}")]
    Detached(String),

    /// Script evaluation inside the page failed.
    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    /// The connection to the page is gone.
    #[error("Page disconnected: {0}")]
    Disconnected(String),

    /// The page backend cannot perform this operation.
    #[error("Unsupported page operation: {0}")]
    Unsupported(String),
}

/// Errors raised by overlay surfaces and the renderers drawing on them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OverlayError {
    /// The renderer or its surface has already been destroyed.
    #[error("Overlay already destroyed")]
    Destroyed,

    /// The surface rejected a draw or could not be created.
    #[error("Surface error: {0}")]
    Surface(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
