//! Page captures for the reasoning service.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use guidepost_session::{
    ElementSnapshot, IdMinter, PageContext, PageContextProvider, SessionError, annotate,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use crate::cdp::{CdpError, CdpEvent, PageSession};
use crate::scripts::ensure_installed;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Captures markup, a screenshot and the annotated interactive elements.
///
/// Minted identifiers are written back into the page under the automation
/// attribute so the executor can find whatever the service picks. The
/// counter starts over whenever the top frame navigates.
pub struct CdpContextProvider {
    session: Arc<PageSession>,
    automation_attribute: String,
    excluded_ids: Vec<String>,
    minter: Arc<IdMinter>,
    navigations: Mutex<broadcast::Receiver<CdpEvent>>,
}

impl CdpContextProvider {
    pub async fn attach(
        session: Arc<PageSession>,
        automation_attribute: impl Into<String>,
        excluded_ids: Vec<String>,
    ) -> Result<Self, CdpError> {
        ensure_installed(&session).await?;
        let navigations = session.events()?;
        Ok(Self {
            session,
            automation_attribute: automation_attribute.into(),
            excluded_ids,
            minter: Arc::new(IdMinter::new()),
            navigations: Mutex::new(navigations),
        })
    }

    pub fn minter(&self) -> &Arc<IdMinter> {
        &self.minter
    }

    fn reset_after_navigation(&self) {
        let mut navigations = self.navigations.lock();
        let mut navigated = false;
        loop {
            match navigations.try_recv() {
                Ok(event) => navigated |= event.is_main_frame_navigation(),
                // Missed events may have included a navigation.
                Err(TryRecvError::Lagged(_)) => navigated = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if navigated {
            debug!(minted = self.minter.minted(), "Page navigated, restarting element ids");
            self.minter.reset();
        }
    }
}

#[async_trait]
impl PageContextProvider for CdpContextProvider {
    async fn capture(&self) -> Result<PageContext, SessionError> {
        self.reset_after_navigation();

        let reply = self
            .session
            .invoke("__guidepost.snapshot.collect", &[&self.excluded_ids])
            .await?;
        let snapshots: Vec<ElementSnapshot> = serde_json::from_value(reply)
            .map_err(|e| SessionError::Context(format!("unexpected snapshot: {}", e)))?;

        let annotated = annotate(&snapshots, &self.minter);
        let pairs: Vec<(usize, &str)> = annotated
            .iter()
            .map(|(index, element)| (*index, element.id.as_str()))
            .collect();
        let written = self
            .session
            .invoke(
                "__guidepost.snapshot.assign",
                &[json!(self.automation_attribute), json!(pairs)],
            )
            .await?;
        debug!(
            candidates = snapshots.len(),
            annotated = annotated.len(),
            written = written.as_u64().unwrap_or(0),
            "Annotated interactive elements"
        );

        let serialized_markup = self.session.get_content().await?;
        let screenshot = screenshot_data_uri(&self.session.screenshot_png().await?)?;

        Ok(PageContext {
            serialized_markup,
            screenshot,
            interactive_elements: annotated.into_iter().map(|(_, e)| e).collect(),
        })
    }
}

/// Wrap base64 PNG data from `Page.captureScreenshot` as a data URI.
fn screenshot_data_uri(data: &str) -> Result<String, SessionError> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| SessionError::Context(format!("screenshot is not base64: {}", e)))?;
    if !bytes.starts_with(PNG_SIGNATURE) {
        return Err(SessionError::Context("screenshot is not a PNG".to_string()));
    }
    Ok(format!("data:image/png;base64,{}", data))
}
