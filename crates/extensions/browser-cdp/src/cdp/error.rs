//! CDP error types.

use guidepost_protocols::{OverlayError, PageError};
use guidepost_session::SessionError;
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    /// No open tab matched.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Script threw inside the page.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::SessionClosed | CdpError::WebSocket(_) | CdpError::ConnectionFailed(_) => {
                PageError::Disconnected(e.to_string())
            }
            CdpError::JavaScript(msg) => PageError::Evaluation(msg),
            other => PageError::Evaluation(other.to_string()),
        }
    }
}

impl From<CdpError> for OverlayError {
    fn from(e: CdpError) -> Self {
        OverlayError::Surface(e.to_string())
    }
}

impl From<CdpError> for SessionError {
    fn from(e: CdpError) -> Self {
        SessionError::Context(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_session_is_a_disconnect() {
        let err: PageError = CdpError::SessionClosed.into();
        assert!(matches!(err, PageError::Disconnected(_)));
    }

    #[test]
    fn test_script_failure_is_an_evaluation_error() {
        let err: PageError = CdpError::JavaScript("boom".to_string()).into();
        assert_eq!(err, PageError::Evaluation("boom".to_string()));
    }

    #[test]
    fn test_overlay_and_session_mapping() {
        let overlay: OverlayError = CdpError::Timeout("draw".to_string()).into();
        assert!(matches!(overlay, OverlayError::Surface(msg) if msg.contains("draw")));

        let session: SessionError = CdpError::PageNotFound("shop".to_string()).into();
        assert!(matches!(session, SessionError::Context(msg) if msg.contains("shop")));
    }
}
