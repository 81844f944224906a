//! Element outline with an optional caption.

use std::sync::Arc;
use std::time::Duration;

use guidepost_config::HighlightConfig;
use guidepost_protocols::{
    BoundingBox, FrameClock, OverlayError, Point, Scene, Shape, Size, Surface,
};
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::easing::{cycle_phase, progress, triangle};

/// Average glyph advance relative to the font size.
const GLYPH_WIDTH: f64 = 0.6;
const LINE_HEIGHT: f64 = 1.2;

/// Observable highlight state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightState {
    pub bounding_box: Option<BoundingBox>,
    pub visible: bool,
}

/// Points along the box outline, clockwise from the top-left corner,
/// covering `progress` of the perimeter.
pub fn trace_perimeter(b: &BoundingBox, progress: f64) -> Vec<Point> {
    let corners = [
        Point::new(b.left(), b.top()),
        Point::new(b.right(), b.top()),
        Point::new(b.right(), b.bottom()),
        Point::new(b.left(), b.bottom()),
    ];
    if progress >= 1.0 {
        return corners.to_vec();
    }

    let mut remaining = 2.0 * (b.width + b.height) * progress.max(0.0);
    let mut points = vec![corners[0]];
    for i in 0..corners.len() {
        let (from, to) = (corners[i], corners[(i + 1) % corners.len()]);
        let length = from.distance(to);
        if remaining >= length {
            points.push(to);
            remaining -= length;
        } else {
            if remaining > 0.0 {
                points.push(from.lerp(to, remaining / length));
            }
            break;
        }
    }
    points
}

/// `text` shortened with a trailing ellipsis so its caption fits within
/// `max_width`. Returns an empty string when not even one glyph fits.
pub fn fit_label(text: &str, config: &HighlightConfig, max_width: f64) -> String {
    let glyph = config.label_font_px * GLYPH_WIDTH;
    let room = max_width - config.label_padding * 2.0;
    let capacity = if glyph > 0.0 { (room / glyph).floor().max(0.0) as usize } else { usize::MAX };

    let count = text.chars().count();
    if count <= capacity {
        return text.to_string();
    }
    if capacity == 0 {
        return String::new();
    }
    let mut fitted: String = text.chars().take(capacity - 1).collect();
    fitted.push('\u{2026}');
    fitted
}

/// Caption rectangle centred under the box, kept entirely inside `canvas`.
///
/// `text` should already be fitted with [`fit_label`]; the rectangle is
/// capped at the canvas size either way.
pub fn label_rect(b: &BoundingBox, text: &str, config: &HighlightConfig, canvas: Size) -> BoundingBox {
    let text_width = text.chars().count() as f64 * config.label_font_px * GLYPH_WIDTH;
    let width = (text_width + config.label_padding * 2.0).min(canvas.width.max(0.0));
    let height =
        (config.label_font_px * LINE_HEIGHT + config.label_padding * 2.0).min(canvas.height.max(0.0));

    let center_x = b
        .center()
        .x
        .min(canvas.width - width / 2.0)
        .max(width / 2.0);
    let top = (b.bottom() + config.label_gap).min(canvas.height - height);

    BoundingBox::new(center_x - width / 2.0, top.max(0.0), width, height)
}

/// Idle opacity: starts at the maximum, dips to the minimum mid-cycle.
pub fn pulse_opacity(elapsed: Duration, config: &HighlightConfig) -> f64 {
    let depth = triangle(cycle_phase(elapsed, config.pulse_period()));
    config.pulse_max_opacity - (config.pulse_max_opacity - config.pulse_min_opacity) * depth
}

struct Inner {
    bounding_box: Option<BoundingBox>,
    label: String,
    visible: bool,
    animation: Option<CancellationToken>,
    destroyed: bool,
}

impl Inner {
    fn stop_animation(&mut self) {
        if let Some(token) = self.animation.take() {
            token.cancel();
        }
    }
}

struct Shared {
    surface: Arc<dyn Surface>,
    clock: Arc<dyn FrameClock>,
    config: HighlightConfig,
    state: Mutex<Inner>,
}

impl Shared {
    fn draw(&self, inner: &Inner, trace: f64, opacity: f64) -> Result<(), OverlayError> {
        let Some(b) = inner.bounding_box else {
            return self.surface.clear();
        };
        let c = &self.config;
        let mut scene = Scene::new();
        scene.push(Shape::Polyline {
            points: trace_perimeter(&b, trace),
            stroke: c.color.with_alpha(opacity),
            line_width: c.line_width,
            closed: trace >= 1.0,
            shadow_blur: c.glow_size,
        });
        let canvas = self.surface.size();
        let text = fit_label(&inner.label, c, canvas.width);
        if trace >= 1.0 && !text.is_empty() {
            scene.push(Shape::Label {
                rect: label_rect(&b, &text, c, canvas),
                text,
                background: c.label_background,
                color: c.label_color,
                font_px: c.label_font_px,
                corner_radius: c.label_corner_radius,
            });
        }
        self.surface.draw(&scene)
    }

    fn animate(self: &Arc<Self>, inner: &mut Inner) -> Result<(), OverlayError> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, drawing static highlight");
            return self.draw(inner, 1.0, self.config.pulse_max_opacity);
        };

        let token = CancellationToken::new();
        inner.animation = Some(token.clone());
        let shared = Arc::clone(self);
        let started = Instant::now();

        runtime.spawn(async move {
            let trace = shared.config.trace_duration();
            loop {
                let now = tokio::select! {
                    _ = token.cancelled() => break,
                    now = shared.clock.next_frame() => now,
                };
                let mut inner = shared.state.lock();
                if token.is_cancelled() || inner.destroyed {
                    break;
                }
                let elapsed = now.saturating_duration_since(started);
                let traced = progress(elapsed, trace);

                let result = if traced < 1.0 {
                    shared.draw(&inner, traced, 1.0)
                } else if shared.config.pulse {
                    shared.draw(&inner, 1.0, pulse_opacity(elapsed.saturating_sub(trace), &shared.config))
                } else {
                    let done = shared.draw(&inner, 1.0, shared.config.pulse_max_opacity);
                    if done.is_ok() {
                        // Static outline drawn; nothing left to animate.
                        inner.animation = None;
                        break;
                    }
                    done
                };
                if let Err(e) = result {
                    debug!(error = %e, "Highlight animation stopped");
                    inner.animation = None;
                    break;
                }
            }
        });
        Ok(())
    }
}

/// Draws and animates the outline of the current target.
///
/// Dropping the renderer destroys it.
pub struct HighlightRenderer {
    shared: Arc<Shared>,
}

impl HighlightRenderer {
    pub fn new(
        surface: Arc<dyn Surface>,
        clock: Arc<dyn FrameClock>,
        config: HighlightConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                surface,
                clock,
                config,
                state: Mutex::new(Inner {
                    bounding_box: None,
                    label: String::new(),
                    visible: false,
                    animation: None,
                    destroyed: false,
                }),
            }),
        }
    }

    pub fn state(&self) -> HighlightState {
        let inner = self.shared.state.lock();
        HighlightState {
            bounding_box: inner.bounding_box,
            visible: inner.visible,
        }
    }

    /// True while the trace or pulse task is still drawing frames.
    pub fn is_animating(&self) -> bool {
        self.shared.state.lock().animation.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().destroyed
    }

    /// Trace `bounding_box`, then pulse until hidden.
    ///
    /// Boxes with a negative origin or a non-positive size are ignored
    /// and nothing is drawn.
    pub fn show(&self, bounding_box: BoundingBox, label: &str) -> Result<(), OverlayError> {
        let mut inner = self.shared.state.lock();
        if inner.destroyed {
            return Err(OverlayError::Destroyed);
        }
        if !bounding_box.is_drawable() {
            warn!(?bounding_box, "Ignoring invalid highlight box");
            return Ok(());
        }

        inner.stop_animation();
        inner.bounding_box = Some(bounding_box);
        inner.label = label.to_string();
        inner.visible = true;
        debug!(?bounding_box, label, "Highlight shown");
        self.shared.animate(&mut inner)
    }

    /// Stop the pulse and blank the surface.
    pub fn hide(&self) -> Result<(), OverlayError> {
        let mut inner = self.shared.state.lock();
        if inner.destroyed {
            return Err(OverlayError::Destroyed);
        }
        inner.stop_animation();
        inner.visible = false;
        self.shared.surface.clear()
    }

    /// Stop everything and release the surface. Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut inner = self.shared.state.lock();
        if inner.destroyed {
            return;
        }
        inner.destroyed = true;
        inner.stop_animation();
        inner.visible = false;
        self.shared.surface.release();
        debug!("Highlight destroyed");
    }
}

impl Drop for HighlightRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "highlight_tests.rs"]
mod tests;
