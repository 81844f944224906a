//! Overlay drawing and frame pacing ports.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::OverlayError;
use crate::geometry::Size;
use crate::scene::Scene;

/// Attribute carried by every overlay node injected into the page, so
/// page captures can leave them out.
pub const OVERLAY_ATTRIBUTE: &str = "data-guidepost-overlay";

/// Which overlay a surface belongs to. Cursor sits above highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Cursor,
    Highlight,
}

impl Layer {
    /// Stacking order above page content.
    pub fn z_index(&self) -> u32 {
        match self {
            Layer::Cursor => 10_000,
            Layer::Highlight => 9_999,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Cursor => "cursor",
            Layer::Highlight => "highlight",
        }
    }
}

/// A full-viewport, pointer-transparent drawable owned by one renderer.
///
/// Methods are synchronous so renderers can call them while holding their
/// state lock; remote implementations queue the work.
pub trait Surface: Send + Sync {
    /// Current drawable size in CSS pixels.
    fn size(&self) -> Size;

    /// Replace the surface contents with `scene`.
    fn draw(&self, scene: &Scene) -> Result<(), OverlayError>;

    /// Erase everything, keeping the surface alive.
    fn clear(&self) -> Result<(), OverlayError>;

    /// Remove the surface permanently.
    fn release(&self);
}

/// Creates overlay surfaces.
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
    async fn create_surface(&self, layer: Layer) -> Result<Arc<dyn Surface>, OverlayError>;
}

/// The animation-frame tick.
#[async_trait]
pub trait FrameClock: Send + Sync {
    /// Resolve at the next frame boundary with its timestamp.
    async fn next_frame(&self) -> Instant;
}
