//! Smooth scrolling with settle detection.

use std::sync::Arc;

use guidepost_config::ScrollConfig;
use guidepost_protocols::{BoundingBox, FrameClock, Page, PageError, ScrollBehavior, Viewport};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::locator::{ElementLocator, Located};

/// Where a [`ScrollSettler`] stands after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStatus {
    Moving,
    Settled,
    TimedOut,
}

/// Tracks consecutive unchanged scroll positions against a deadline.
///
/// The first observation only establishes a baseline. Each later
/// observation within `epsilon` of the previous one counts towards
/// `required`; any larger move resets the count.
#[derive(Debug, Clone)]
pub struct ScrollSettler {
    required: u32,
    epsilon: f64,
    deadline: Instant,
    last: Option<f64>,
    stable: u32,
}

impl ScrollSettler {
    pub fn new(required: u32, epsilon: f64, deadline: Instant) -> Self {
        Self {
            required: required.max(1),
            epsilon: epsilon.max(0.0),
            deadline,
            last: None,
            stable: 0,
        }
    }

    pub fn stable_count(&self) -> u32 {
        self.stable
    }

    pub fn observe(&mut self, position: f64, now: Instant) -> SettleStatus {
        match self.last {
            Some(last) if (position - last).abs() <= self.epsilon => self.stable += 1,
            _ => self.stable = 0,
        }
        self.last = Some(position);

        if self.stable >= self.required {
            SettleStatus::Settled
        } else if now >= self.deadline {
            SettleStatus::TimedOut
        } else {
            SettleStatus::Moving
        }
    }
}

/// The result of bringing an element into view.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    /// Fresh geometry, or the pre-scroll lookup if re-locating failed.
    pub located: Located,
    pub timed_out: bool,
}

/// Scrolls targets to a comfortable offset below the top of the viewport.
#[derive(Clone)]
pub struct ViewportScroller {
    page: Arc<dyn Page>,
    clock: Arc<dyn FrameClock>,
    config: ScrollConfig,
}

impl ViewportScroller {
    pub fn new(page: Arc<dyn Page>, clock: Arc<dyn FrameClock>, config: ScrollConfig) -> Self {
        Self {
            page,
            clock,
            config,
        }
    }

    /// Document scroll offset that puts the element's top edge at
    /// `viewport_fraction` of the viewport height.
    pub fn target_offset(&self, viewport: &Viewport, bounds: &BoundingBox) -> f64 {
        let target = viewport.scroll_y + bounds.y - viewport.height * self.config.viewport_fraction;
        target.max(0.0)
    }

    /// Smooth-scroll to `located`, wait for the viewport to settle, then
    /// re-run the lookup for post-scroll geometry.
    pub async fn scroll_into_view(
        &self,
        locator: &ElementLocator,
        located: &Located,
    ) -> Result<ScrollOutcome, PageError> {
        let viewport = self.page.viewport().await?;
        let top = self.target_offset(&viewport, &located.bounds);
        debug!(
            identifier = %located.identifier,
            from = viewport.scroll_y,
            to = top,
            "Scrolling element into view"
        );
        self.page.scroll_to(top, ScrollBehavior::Smooth).await?;

        let timed_out = !self.wait_for_settle().await?;

        let located = match locator.locate(&located.identifier).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(
                    identifier = %located.identifier,
                    error = %e,
                    "Re-locate after scroll failed, keeping previous geometry"
                );
                located.clone()
            }
        };
        Ok(ScrollOutcome { located, timed_out })
    }

    /// Returns `false` when the settle ceiling elapsed first.
    async fn wait_for_settle(&self) -> Result<bool, PageError> {
        let timeout = self.config.settle_timeout();
        let deadline = Instant::now() + timeout;
        let mut settler = ScrollSettler::new(self.config.stable_frames, self.config.epsilon_px, deadline);

        match tokio::time::timeout_at(deadline, self.poll(&mut settler)).await {
            Ok(Ok(SettleStatus::Settled)) => Ok(true),
            Ok(Ok(_)) | Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Scroll did not settle in time");
                Ok(false)
            }
            Ok(Err(e)) => Err(e),
        }
    }

    async fn poll(&self, settler: &mut ScrollSettler) -> Result<SettleStatus, PageError> {
        loop {
            let now = self.clock.next_frame().await;
            let viewport = self.page.viewport().await?;
            match settler.observe(viewport.scroll_y, now) {
                SettleStatus::Moving => continue,
                status => return Ok(status),
            }
        }
    }
}

#[cfg(test)]
#[path = "scroller_tests.rs"]
mod tests;
