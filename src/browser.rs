//! Wiring the CDP adapters to one Chrome tab.

use std::sync::Arc;

use guidepost_browser_cdp::{CdpClient, CdpError, CdpPage, CdpSurfaceProvider, PageSession};
use guidepost_config::{BrowserConfig, GuideConfig};
use guidepost_executor::WorkflowExecutor;
use guidepost_overlay::TickerClock;
use tracing::{info, warn};

/// An attached tab with its page and overlay adapters.
pub(crate) struct BrowserTab {
    // Owns the socket; dropping it ends the session.
    _client: CdpClient,
    session: Arc<PageSession>,
    page: Arc<CdpPage>,
    surfaces: Arc<CdpSurfaceProvider>,
}

impl BrowserTab {
    pub(crate) async fn connect(config: &BrowserConfig) -> Result<Self, CdpError> {
        let client = CdpClient::connect(&config.cdp_endpoint, config.call_timeout()).await?;
        info!(browser = client.browser(), endpoint = %config.cdp_endpoint, "Connected to Chrome");

        let session = Arc::new(client.first_page(config.page_url_contains.as_deref()).await?);
        let page = Arc::new(CdpPage::attach(session.clone()).await?);
        let surfaces = Arc::new(CdpSurfaceProvider::attach(session.clone()).await?);
        info!(target_id = session.target_id(), "Attached to page");

        Ok(Self {
            _client: client,
            session,
            page,
            surfaces,
        })
    }

    pub(crate) fn session(&self) -> &Arc<PageSession> {
        &self.session
    }

    pub(crate) fn executor(&self, config: Arc<GuideConfig>) -> WorkflowExecutor {
        let clock = Arc::new(TickerClock::new(config.executor.frame_interval()));
        WorkflowExecutor::new(self.page.clone(), self.surfaces.clone(), clock, config)
    }

    /// Detach from the tab, leaving it open.
    pub(crate) async fn close(self) {
        if let Err(e) = self.session.detach().await {
            warn!("Failed to detach from page: {}", e);
        }
    }
}
