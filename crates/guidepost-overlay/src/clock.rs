//! Timer-driven frame clock.

use std::time::Duration;

use async_trait::async_trait;
use guidepost_protocols::FrameClock;
use tokio::time::Instant;

/// Ticks every `interval` on the tokio timer.
#[derive(Debug, Clone)]
pub struct TickerClock {
    interval: Duration,
}

impl TickerClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Roughly 60 frames per second.
    pub fn sixty_hz() -> Self {
        Self::new(Duration::from_millis(16))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for TickerClock {
    fn default() -> Self {
        Self::sixty_hz()
    }
}

#[async_trait]
impl FrameClock for TickerClock {
    async fn next_frame(&self) -> Instant {
        tokio::time::sleep(self.interval).await;
        Instant::now()
    }
}
