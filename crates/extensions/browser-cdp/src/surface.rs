//! Overlay surfaces backed by an injected canvas per layer.
//!
//! [`Surface`] calls are synchronous, so each surface queues its work for a
//! pump task that replays scenes through `js/overlay.js`. Draws that pile
//! up behind a slow connection collapse to the newest one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use guidepost_protocols::{Layer, OverlayError, Scene, Size, Surface, SurfaceProvider};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cdp::{CdpError, PageSession};
use crate::scripts::ensure_installed;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Draw(Value),
    Clear,
    Release,
}

/// One overlay canvas in the page.
pub struct CdpSurface {
    layer: Layer,
    size: Arc<Mutex<Size>>,
    commands: mpsc::UnboundedSender<Command>,
    released: AtomicBool,
}

impl CdpSurface {
    fn new(layer: Layer, size: Arc<Mutex<Size>>, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            layer,
            size,
            commands,
            released: AtomicBool::new(false),
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    fn send(&self, command: Command) -> Result<(), OverlayError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(OverlayError::Destroyed);
        }
        self.commands
            .send(command)
            .map_err(|_| OverlayError::Surface(format!("{} overlay pump stopped", self.layer.as_str())))
    }
}

impl Surface for CdpSurface {
    fn size(&self) -> Size {
        *self.size.lock()
    }

    fn draw(&self, scene: &Scene) -> Result<(), OverlayError> {
        let scene = serde_json::to_value(scene).map_err(|e| OverlayError::Surface(e.to_string()))?;
        self.send(Command::Draw(scene))
    }

    fn clear(&self) -> Result<(), OverlayError> {
        self.send(Command::Clear)
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            let _ = self.commands.send(Command::Release);
        }
    }
}

/// Creates one canvas overlay per layer in an attached page.
pub struct CdpSurfaceProvider {
    session: Arc<PageSession>,
}

impl CdpSurfaceProvider {
    pub async fn attach(session: Arc<PageSession>) -> Result<Self, CdpError> {
        ensure_installed(&session).await?;
        Ok(Self { session })
    }
}

#[async_trait]
impl SurfaceProvider for CdpSurfaceProvider {
    async fn create_surface(&self, layer: Layer) -> Result<Arc<dyn Surface>, OverlayError> {
        let size = create_canvas(&self.session, layer).await?;
        debug!(layer = layer.as_str(), width = size.width, height = size.height, "Overlay canvas created");

        let size = Arc::new(Mutex::new(size));
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(self.session.clone(), layer, size.clone(), rx));

        Ok(Arc::new(CdpSurface::new(layer, size, tx)))
    }
}

async fn create_canvas(session: &PageSession, layer: Layer) -> Result<Size, OverlayError> {
    let reply = session
        .invoke(
            "__guidepost.overlay.create",
            &[json!(layer.as_str()), json!(layer.z_index())],
        )
        .await?;
    serde_json::from_value(reply).map_err(|e| OverlayError::Surface(e.to_string()))
}

/// Wait for a command, then skip ahead to the newest queued one.
/// A release is never skipped.
async fn next_command(rx: &mut mpsc::UnboundedReceiver<Command>) -> Option<Command> {
    let mut command = rx.recv().await?;
    while command != Command::Release {
        match rx.try_recv() {
            Ok(next) => command = next,
            Err(_) => break,
        }
    }
    Some(command)
}

async fn pump(
    session: Arc<PageSession>,
    layer: Layer,
    size: Arc<Mutex<Size>>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let name = layer.as_str();
    while let Some(command) = next_command(&mut rx).await {
        let reply = match &command {
            Command::Draw(scene) => {
                session
                    .invoke("__guidepost.overlay.draw", &[json!(name), scene.clone()])
                    .await
            }
            Command::Clear => session.invoke("__guidepost.overlay.clear", &[name]).await,
            Command::Release => {
                if let Err(e) = session.invoke("__guidepost.overlay.release", &[name]).await {
                    debug!(layer = name, "Overlay release failed: {}", e);
                }
                break;
            }
        };

        match reply {
            Ok(Value::Null) => {
                // The document was replaced; put the canvas back for the next frame.
                match create_canvas(&session, layer).await {
                    Ok(s) => *size.lock() = s,
                    Err(e) => warn!(layer = name, "Failed to recreate overlay canvas: {}", e),
                }
            }
            Ok(reply) => {
                if let Ok(s) = serde_json::from_value::<Size>(reply) {
                    *size.lock() = s;
                }
            }
            Err(e) if session.is_closed() => {
                debug!(layer = name, "Overlay pump stopping: {}", e);
                break;
            }
            Err(e) => warn!(layer = name, "Overlay update failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use guidepost_protocols::{Point, Rgba, Shape};

    use super::*;

    fn surface() -> (CdpSurface, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let size = Arc::new(Mutex::new(Size::new(1024.0, 768.0)));
        (CdpSurface::new(Layer::Cursor, size, tx), rx)
    }

    fn dot(x: f64) -> Scene {
        Scene::from_iter([Shape::Circle {
            center: Point::new(x, 10.0),
            radius: 8.0,
            fill: Rgba::new(75, 75, 255, 0.8),
        }])
    }

    #[test]
    fn test_draw_queues_scene_json() {
        let (surface, mut rx) = surface();
        surface.draw(&dot(5.0)).unwrap();

        let Ok(Command::Draw(scene)) = rx.try_recv() else {
            panic!("expected a queued draw");
        };
        assert_eq!(scene["shapes"][0]["kind"], "circle");
        assert_eq!(scene["shapes"][0]["fill"], "rgba(75, 75, 255, 0.8)");
        assert_eq!(surface.size(), Size::new(1024.0, 768.0));
    }

    #[test]
    fn test_release_is_sent_once_and_blocks_drawing() {
        let (surface, mut rx) = surface();
        surface.release();
        surface.release();

        assert_eq!(rx.try_recv(), Ok(Command::Release));
        assert!(rx.try_recv().is_err());
        assert_eq!(surface.draw(&dot(1.0)), Err(OverlayError::Destroyed));
        assert_eq!(surface.clear(), Err(OverlayError::Destroyed));
    }

    #[test]
    fn test_stopped_pump_is_a_surface_error() {
        let (surface, rx) = surface();
        drop(rx);
        assert!(matches!(surface.clear(), Err(OverlayError::Surface(_))));
    }

    #[tokio::test]
    async fn test_queued_draws_collapse_to_newest() {
        let (surface, mut rx) = surface();
        for x in [1.0, 2.0, 3.0] {
            surface.draw(&dot(x)).unwrap();
        }

        let Some(Command::Draw(scene)) = next_command(&mut rx).await else {
            panic!("expected a draw");
        };
        assert_eq!(scene["shapes"][0]["center"]["x"], 3.0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_release_is_never_skipped() {
        let (surface, mut rx) = surface();
        surface.draw(&dot(1.0)).unwrap();
        surface.release();

        assert_eq!(next_command(&mut rx).await, Some(Command::Release));
    }
}
