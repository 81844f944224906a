//! The [`Page`] port over a CDP page session.
//!
//! Nodes are addressed through the handle registry installed by
//! `js/registry.js`. Listeners report back through a runtime binding; each
//! subscription gets its own token so overlapping runs never see each
//! other's events.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use guidepost_protocols::{
    BoundingBox, ListenSpec, ListenerGuard, NodeRef, Page, PageError, PageEvent, ScrollBehavior,
    Subscription, Viewport,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use crate::cdp::{CdpError, CdpEvent, PageSession};
use crate::scripts::{SIGNAL_BINDING, ensure_installed};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryReply {
    Nodes { nodes: Vec<String> },
    Invalid { invalid: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowMetrics {
    width: f64,
    height: f64,
    #[serde(default)]
    scroll_x: f64,
    #[serde(default)]
    scroll_y: f64,
}

/// One message from the listener script.
#[derive(Debug, Deserialize)]
struct Signal {
    token: String,
    event: PageEvent,
}

/// A browser tab driven over CDP.
pub struct CdpPage {
    session: Arc<PageSession>,
    tokens: AtomicU64,
}

impl CdpPage {
    /// Install the page scripts and wrap the session.
    pub async fn attach(session: Arc<PageSession>) -> Result<Self, CdpError> {
        ensure_installed(&session).await?;
        Ok(Self {
            session,
            tokens: AtomicU64::new(1),
        })
    }

    pub fn session(&self) -> &Arc<PageSession> {
        &self.session
    }
}

fn evaluation(e: serde_json::Error) -> PageError {
    PageError::Evaluation(format!("unexpected page reply: {}", e))
}

#[async_trait]
impl Page for CdpPage {
    async fn query_all(&self, selector: &str) -> Result<Vec<NodeRef>, PageError> {
        let reply = self.session.invoke("__guidepost.query", &[selector]).await?;
        match serde_json::from_value(reply).map_err(evaluation)? {
            QueryReply::Nodes { nodes } => Ok(nodes.into_iter().map(NodeRef::new).collect()),
            QueryReply::Invalid { invalid } => Err(PageError::InvalidSelector(format!(
                "{}: {}",
                selector, invalid
            ))),
        }
    }

    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, PageError> {
        let reply = self
            .session
            .invoke("__guidepost.rect", &[node.as_str()])
            .await?;
        if reply.is_null() {
            return Ok(None);
        }
        serde_json::from_value(reply).map(Some).map_err(evaluation)
    }

    async fn viewport(&self) -> Result<Viewport, PageError> {
        let reply = self
            .session
            .invoke::<&str>("__guidepost.viewport", &[])
            .await?;
        let m: WindowMetrics = serde_json::from_value(reply).map_err(evaluation)?;
        Ok(Viewport {
            width: m.width,
            height: m.height,
            scroll_x: m.scroll_x,
            scroll_y: m.scroll_y,
        })
    }

    async fn scroll_to(&self, top: f64, behavior: ScrollBehavior) -> Result<(), PageError> {
        trace!(top, ?behavior, "scrollTo");
        self.session
            .invoke("__guidepost.scrollTo", &[json!(top), json!(behavior)])
            .await?;
        Ok(())
    }

    async fn click(&self, node: &NodeRef) -> Result<(), PageError> {
        let clicked = self
            .session
            .invoke("__guidepost.click", &[node.as_str()])
            .await?;
        if clicked.as_bool() == Some(true) {
            debug!(node = %node, "Synthetic click dispatched");
            Ok(())
        } else {
            Err(PageError::Detached(node.to_string()))
        }
    }

    async fn listen(&self, spec: ListenSpec) -> Result<Subscription, PageError> {
        let token = format!("l{}", self.tokens.fetch_add(1, Ordering::SeqCst));

        // Subscribe first so nothing fired during installation is lost.
        let browser_events = self.session.events()?;
        let spec = serde_json::to_value(&spec).map_err(CdpError::from)?;
        self.session
            .invoke("__guidepost.listen", &[json!(token), spec])
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let forward = tokio::spawn(forward_signals(browser_events, token.clone(), tx));

        let session = self.session.clone();
        let guard = ListenerGuard::new(move || {
            forward.abort();
            let Ok(handle) = tokio::runtime::Handle::try_current() else {
                return;
            };
            handle.spawn(async move {
                if let Err(e) = session.invoke("__guidepost.unlisten", &[token.as_str()]).await {
                    debug!(token = %token, "Failed to detach page listeners: {}", e);
                }
            });
        });

        Ok(Subscription::new(rx, guard))
    }
}

async fn forward_signals(
    mut events: broadcast::Receiver<CdpEvent>,
    token: String,
    tx: mpsc::UnboundedSender<PageEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(page_event) = translate(&event, &token) {
                    if tx.send(page_event).is_err() {
                        break;
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Page signal stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Map a browser event onto the subscription identified by `token`.
pub(crate) fn translate(event: &CdpEvent, token: &str) -> Option<PageEvent> {
    if event.is_main_frame_navigation() {
        return Some(PageEvent::Unload);
    }
    let payload = event.binding_payload(SIGNAL_BINDING)?;
    match serde_json::from_str::<Signal>(payload) {
        Ok(signal) if signal.token == token => Some(signal.event),
        Ok(_) => None,
        Err(e) => {
            warn!("Discarding malformed page signal: {}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
