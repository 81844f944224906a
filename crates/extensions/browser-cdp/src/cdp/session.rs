//! CDP page session for interacting with a single page.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{OnceCell, broadcast};
use tracing::debug;

use super::client::Connection;
use super::error::CdpError;
use super::protocol::CdpEvent;

/// A session attached to a single page target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    connection: Arc<Connection>,
    /// Set once the page scripts and binding are installed.
    pub(crate) prepared: OnceCell<()>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, connection: Arc<Connection>) -> Self {
        Self {
            target_id,
            session_id,
            connection,
            prepared: OnceCell::new(),
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.connection
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Events the browser pushes for this page.
    pub fn events(&self) -> Result<broadcast::Receiver<CdpEvent>, CdpError> {
        self.connection
            .subscribe(&self.session_id)
            .ok_or(CdpError::SessionClosed)
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Call `function` (a global path such as `__guidepost.rect`) with
    /// JSON-encoded arguments.
    pub async fn invoke<A: Serialize>(&self, function: &str, args: &[A]) -> Result<Value, CdpError> {
        self.evaluate(&invocation(function, args)?).await
    }

    /// Run `source` now and in every document this page loads from here on.
    pub async fn add_init_script(&self, source: &str) -> Result<(), CdpError> {
        self.call(
            "Page.addScriptToEvaluateOnNewDocument",
            Some(json!({ "source": source })),
        )
        .await?;
        self.evaluate(source).await?;
        Ok(())
    }

    /// Expose `window[name](payload)`, reported as `Runtime.bindingCalled`.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({ "name": name })))
            .await?;
        Ok(())
    }

    pub async fn get_content(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.documentElement.outerHTML").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Capture the visible viewport as base64-encoded PNG.
    pub async fn screenshot_png(&self) -> Result<String, CdpError> {
        let result = self
            .call("Page.captureScreenshot", Some(json!({ "format": "png" })))
            .await?;

        result["data"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))
    }

    /// Detach from the target, leaving the tab open.
    pub async fn detach(&self) -> Result<(), CdpError> {
        let result = self
            .connection
            .call(
                "Target.detachFromTarget",
                Some(json!({ "sessionId": self.session_id })),
                None,
            )
            .await;
        self.connection.unregister_session(&self.session_id);
        result.map(|_| ())
    }
}

/// `function(arg0, arg1, ...)` with each argument as a JSON literal.
fn invocation<A: Serialize>(function: &str, args: &[A]) -> Result<String, CdpError> {
    let args = args
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{}({})", function, args.join(", ")))
}
