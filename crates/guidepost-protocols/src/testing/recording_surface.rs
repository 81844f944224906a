//! Surfaces that record what renderers asked them to do.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::OverlayError;
use crate::geometry::Size;
use crate::scene::Scene;
use crate::surface::{Layer, Surface, SurfaceProvider};

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Draw(Scene),
    Clear,
    Release,
}

/// A [`Surface`] that keeps every call for later inspection.
#[derive(Debug)]
pub struct RecordingSurface {
    layer: Layer,
    size: Mutex<Size>,
    calls: Mutex<Vec<SurfaceCall>>,
    released: AtomicBool,
    failing: AtomicBool,
}

impl RecordingSurface {
    pub fn new(layer: Layer, size: Size) -> Self {
        Self {
            layer,
            size: Mutex::new(size),
            calls: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            failing: AtomicBool::new(false),
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn set_size(&self, size: Size) {
        *self.size.lock() = size;
    }

    /// Make subsequent draws fail.
    pub fn fail_draws(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Draw(_)))
            .count()
    }

    pub fn release_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::Release))
            .count()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn last_scene(&self) -> Option<Scene> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            SurfaceCall::Draw(scene) => Some(scene.clone()),
            _ => None,
        })
    }

    /// True when the most recent call left the surface blank.
    pub fn is_blank(&self) -> bool {
        match self.calls.lock().last() {
            None | Some(SurfaceCall::Clear) | Some(SurfaceCall::Release) => true,
            Some(SurfaceCall::Draw(scene)) => scene.is_empty(),
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        *self.size.lock()
    }

    fn draw(&self, scene: &Scene) -> Result<(), OverlayError> {
        if self.is_released() {
            return Err(OverlayError::Destroyed);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(OverlayError::Surface("draw rejected".to_string()));
        }
        self.calls.lock().push(SurfaceCall::Draw(scene.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<(), OverlayError> {
        if self.is_released() {
            return Err(OverlayError::Destroyed);
        }
        self.calls.lock().push(SurfaceCall::Clear);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.calls.lock().push(SurfaceCall::Release);
    }
}

/// Hands out [`RecordingSurface`]s and remembers them.
#[derive(Debug)]
pub struct RecordingSurfaceProvider {
    size: Size,
    surfaces: Mutex<Vec<Arc<RecordingSurface>>>,
    refuse: Mutex<Option<Layer>>,
}

impl RecordingSurfaceProvider {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            surfaces: Mutex::new(Vec::new()),
            refuse: Mutex::new(None),
        }
    }

    /// Fail creation of surfaces for `layer`.
    pub fn refuse(&self, layer: Layer) {
        *self.refuse.lock() = Some(layer);
    }

    pub fn surfaces(&self) -> Vec<Arc<RecordingSurface>> {
        self.surfaces.lock().clone()
    }

    /// Most recently created surface for `layer`.
    pub fn latest(&self, layer: Layer) -> Option<Arc<RecordingSurface>> {
        self.surfaces
            .lock()
            .iter()
            .rev()
            .find(|s| s.layer() == layer)
            .cloned()
    }
}

#[async_trait]
impl SurfaceProvider for RecordingSurfaceProvider {
    async fn create_surface(&self, layer: Layer) -> Result<Arc<dyn Surface>, OverlayError> {
        if *self.refuse.lock() == Some(layer) {
            return Err(OverlayError::Surface(format!(
                "{} layer unavailable",
                layer.as_str()
            )));
        }
        let surface = Arc::new(RecordingSurface::new(layer, self.size));
        self.surfaces.lock().push(Arc::clone(&surface));
        Ok(surface)
    }
}
