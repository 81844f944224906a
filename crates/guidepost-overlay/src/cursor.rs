//! Synthetic pointer drawn on its own overlay surface.
//!
//! The cursor only knows where it is, where it is going and how to draw
//! itself. Every surface call happens under the state lock, and every
//! animation checks a generation counter after each frame so a newer
//! command (or `hide`/`destroy`) cleanly supersedes it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use guidepost_config::CursorConfig;
use guidepost_protocols::{FrameClock, OverlayError, Point, Scene, Shape, Surface};
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::easing::{SQUISH_SCALE, cycle_phase, ease_in_out_quad, progress, squish_scale};

const RING_WIDTH: f64 = 2.0;
const PULSE_GROWTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    Idle,
    Moving,
    Pulsing,
    Clicking,
    Hidden,
}

struct CursorState {
    position: Point,
    mode: CursorMode,
    generation: u64,
    pulse: Option<CancellationToken>,
    trail: VecDeque<Point>,
    destroyed: bool,
}

impl CursorState {
    fn stop_pulse(&mut self) {
        if let Some(token) = self.pulse.take() {
            token.cancel();
        }
    }

    /// Invalidate whatever animation is in flight.
    fn supersede(&mut self) -> u64 {
        self.stop_pulse();
        self.generation += 1;
        self.generation
    }
}

struct Shared {
    surface: Arc<dyn Surface>,
    clock: Arc<dyn FrameClock>,
    config: CursorConfig,
    state: Mutex<CursorState>,
}

impl Shared {
    fn scene(&self, state: &CursorState, scale: f64, glow: f64, pulse: Option<Duration>) -> Scene {
        let c = &self.config;
        let at = state.position;
        let mut scene = Scene::new();

        let n = state.trail.len();
        for (i, p) in state.trail.iter().enumerate() {
            let weight = (i + 1) as f64 / (n + 1) as f64;
            scene.push(Shape::Circle {
                center: *p,
                radius: c.size / 4.0 * weight,
                fill: c.color.fade(weight * 0.5),
            });
        }

        if let Some(elapsed) = pulse {
            let period = c.pulse_period();
            // Two rings half a period apart.
            for (offset, base, alpha) in [
                (Duration::ZERO, c.size / 4.0, 0.5),
                (period / 2, c.size / 3.0, 0.3),
            ] {
                let phase = cycle_phase(elapsed + offset, period);
                let radius = base * phase * PULSE_GROWTH;
                let opacity = 1.0 - phase;
                if radius > 0.0 && opacity > 0.0 {
                    scene.push(Shape::Ring {
                        center: at,
                        radius,
                        stroke: c.color.with_alpha(alpha * opacity),
                        line_width: RING_WIDTH,
                    });
                }
            }
        }

        scene.push(Shape::Glow {
            center: at,
            radius: c.glow_size * glow,
            color: c.glow_color,
        });
        scene.push(Shape::Circle {
            center: at,
            radius: c.size / 4.0 * scale,
            fill: c.color,
        });
        scene
    }

    fn draw(
        &self,
        state: &CursorState,
        scale: f64,
        glow: f64,
        pulse: Option<Duration>,
    ) -> Result<(), OverlayError> {
        self.surface.draw(&self.scene(state, scale, glow, pulse))
    }

    fn start_pulse(self: &Arc<Self>, state: &mut CursorState) {
        state.stop_pulse();
        state.mode = CursorMode::Pulsing;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, cursor stays static");
            return;
        };

        let token = CancellationToken::new();
        state.pulse = Some(token.clone());
        let shared = Arc::clone(self);
        let started = Instant::now();

        runtime.spawn(async move {
            loop {
                let now = tokio::select! {
                    _ = token.cancelled() => break,
                    now = shared.clock.next_frame() => now,
                };
                let state = shared.state.lock();
                if token.is_cancelled() || state.destroyed {
                    break;
                }
                let elapsed = now.saturating_duration_since(started);
                if let Err(e) = shared.draw(&state, 1.0, 1.0, Some(elapsed)) {
                    debug!(error = %e, "Cursor pulse stopped");
                    break;
                }
            }
        });
    }
}

/// The animated pointer.
///
/// Dropping the renderer destroys it.
pub struct CursorRenderer {
    shared: Arc<Shared>,
}

impl CursorRenderer {
    pub fn new(surface: Arc<dyn Surface>, clock: Arc<dyn FrameClock>, config: CursorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                surface,
                clock,
                config,
                state: Mutex::new(CursorState {
                    position: Point::default(),
                    mode: CursorMode::Idle,
                    generation: 0,
                    pulse: None,
                    trail: VecDeque::new(),
                    destroyed: false,
                }),
            }),
        }
    }

    pub fn position(&self) -> Point {
        self.shared.state.lock().position
    }

    pub fn mode(&self) -> CursorMode {
        self.shared.state.lock().mode
    }

    pub fn is_pulsing(&self) -> bool {
        self.shared.state.lock().pulse.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().destroyed
    }

    /// Jump to `point` without animating.
    ///
    /// An idle pulse keeps running at the new spot; a move or click in
    /// flight is abandoned.
    pub fn set_position(&self, point: Point) -> Result<(), OverlayError> {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return Err(OverlayError::Destroyed);
        }
        if matches!(state.mode, CursorMode::Moving | CursorMode::Clicking) {
            state.supersede();
            state.mode = CursorMode::Idle;
        }
        state.position = point;
        state.trail.clear();
        if state.mode != CursorMode::Hidden {
            self.shared.draw(&state, 1.0, 1.0, None)?;
        }
        Ok(())
    }

    /// Glide to `target` over the configured duration, then pulse.
    ///
    /// Resolves early, without error, when superseded by another command.
    pub async fn move_to(&self, target: Point) -> Result<(), OverlayError> {
        let (generation, from) = {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return Err(OverlayError::Destroyed);
            }
            let generation = state.supersede();
            state.mode = CursorMode::Moving;
            state.trail.clear();
            (generation, state.position)
        };
        debug!(?from, ?target, "Cursor move started");

        let duration = self.shared.config.move_duration();
        let trail_length = self.shared.config.trail_length;
        let started = Instant::now();

        loop {
            let now = self.shared.clock.next_frame().await;
            let t = progress(now.saturating_duration_since(started), duration);

            let mut state = self.shared.state.lock();
            if state.destroyed {
                return Err(OverlayError::Destroyed);
            }
            if state.generation != generation {
                debug!("Cursor move superseded");
                return Ok(());
            }

            if trail_length > 0 {
                let previous = state.position;
                state.trail.push_back(previous);
                while state.trail.len() > trail_length {
                    state.trail.pop_front();
                }
            }
            state.position = from.lerp(target, ease_in_out_quad(t));

            if t >= 1.0 {
                state.position = target;
                state.trail.clear();
                self.shared.draw(&state, 1.0, 1.0, Some(Duration::ZERO))?;
                self.shared.start_pulse(&mut state);
                break;
            }
            self.shared.draw(&state, 1.0, 1.0, None)?;
        }

        debug!(?target, "Cursor move finished");
        Ok(())
    }

    /// Play the click squish. A click already in progress makes this a no-op,
    /// as does a hidden cursor.
    pub async fn click(&self) -> Result<(), OverlayError> {
        let generation = {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return Err(OverlayError::Destroyed);
            }
            if matches!(state.mode, CursorMode::Clicking | CursorMode::Hidden) {
                return Ok(());
            }
            let generation = state.supersede();
            state.mode = CursorMode::Clicking;
            generation
        };

        let duration = self.shared.config.click_duration();
        let started = Instant::now();

        loop {
            let now = self.shared.clock.next_frame().await;
            let t = progress(now.saturating_duration_since(started), duration);

            let mut state = self.shared.state.lock();
            if state.destroyed {
                return Err(OverlayError::Destroyed);
            }
            if state.generation != generation {
                return Ok(());
            }

            let scale = squish_scale(t);
            // Glow doubles at the bottom of the squish.
            let glow = 1.0 + (1.0 - scale) / (1.0 - SQUISH_SCALE);
            self.shared.draw(&state, scale, glow, None)?;

            if t >= 1.0 {
                self.shared.start_pulse(&mut state);
                break;
            }
        }
        Ok(())
    }

    /// Stop animating and blank the surface, keeping the position.
    pub fn hide(&self) -> Result<(), OverlayError> {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return Err(OverlayError::Destroyed);
        }
        state.supersede();
        state.mode = CursorMode::Hidden;
        state.trail.clear();
        self.shared.surface.clear()
    }

    /// Redraw at the last position and resume pulsing.
    pub fn show(&self) -> Result<(), OverlayError> {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return Err(OverlayError::Destroyed);
        }
        if state.mode != CursorMode::Hidden {
            return Ok(());
        }
        self.shared.draw(&state, 1.0, 1.0, Some(Duration::ZERO))?;
        self.shared.start_pulse(&mut state);
        Ok(())
    }

    /// Stop everything and release the surface. Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        state.supersede();
        state.mode = CursorMode::Hidden;
        self.shared.surface.release();
        debug!("Cursor destroyed");
    }
}

impl Drop for CursorRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;
