//! Cursor and highlight appearance.

use std::time::Duration;

use guidepost_protocols::Rgba;
use serde::{Deserialize, Serialize};

/// Cursor renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Core dot diameter in pixels.
    #[serde(default = "default_cursor_size")]
    pub size: f64,

    /// Radius of the soft glow around the dot.
    #[serde(default = "default_glow_size")]
    pub glow_size: f64,

    #[serde(default = "default_cursor_color")]
    pub color: Rgba,

    #[serde(default = "default_cursor_glow_color")]
    pub glow_color: Rgba,

    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,

    #[serde(default = "default_click_duration_ms")]
    pub click_duration_ms: u64,

    #[serde(default = "default_pulse_period_ms")]
    pub pulse_period_ms: u64,

    /// Positions kept for the motion trail. Zero disables it.
    #[serde(default)]
    pub trail_length: usize,
}

impl CursorConfig {
    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }

    pub fn click_duration(&self) -> Duration {
        Duration::from_millis(self.click_duration_ms)
    }

    pub fn pulse_period(&self) -> Duration {
        Duration::from_millis(self.pulse_period_ms)
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            size: default_cursor_size(),
            glow_size: default_glow_size(),
            color: default_cursor_color(),
            glow_color: default_cursor_glow_color(),
            move_duration_ms: default_move_duration_ms(),
            click_duration_ms: default_click_duration_ms(),
            pulse_period_ms: default_pulse_period_ms(),
            trail_length: 0,
        }
    }
}

fn default_cursor_size() -> f64 {
    16.0
}

fn default_glow_size() -> f64 {
    16.0
}

fn default_cursor_color() -> Rgba {
    Rgba::new(75, 75, 255, 0.8)
}

fn default_cursor_glow_color() -> Rgba {
    Rgba::new(75, 75, 255, 0.4)
}

fn default_move_duration_ms() -> u64 {
    1000
}

fn default_click_duration_ms() -> u64 {
    150
}

fn default_pulse_period_ms() -> u64 {
    1400
}

/// Highlight renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Outline colour; its alpha is replaced by the pulse opacity.
    #[serde(default = "default_highlight_color")]
    pub color: Rgba,

    #[serde(default = "default_highlight_glow_color")]
    pub glow_color: Rgba,

    #[serde(default = "default_highlight_glow_size")]
    pub glow_size: f64,

    #[serde(default = "default_line_width")]
    pub line_width: f64,

    #[serde(default = "default_trace_duration_ms")]
    pub trace_duration_ms: u64,

    #[serde(default = "default_pulse_min_opacity")]
    pub pulse_min_opacity: f64,

    #[serde(default = "default_pulse_max_opacity")]
    pub pulse_max_opacity: f64,

    /// Time for one full min-max-min opacity cycle.
    #[serde(default = "default_highlight_pulse_period_ms")]
    pub pulse_period_ms: u64,

    /// Set to false for a static outline after the trace.
    #[serde(default = "super::default_true")]
    pub pulse: bool,

    #[serde(default = "default_label_font_px")]
    pub label_font_px: f64,

    #[serde(default = "default_label_padding")]
    pub label_padding: f64,

    /// Vertical distance between the box and its label.
    #[serde(default = "default_label_gap")]
    pub label_gap: f64,

    #[serde(default = "default_label_corner_radius")]
    pub label_corner_radius: f64,

    #[serde(default = "default_label_background")]
    pub label_background: Rgba,

    #[serde(default = "default_label_color")]
    pub label_color: Rgba,
}

impl HighlightConfig {
    pub fn trace_duration(&self) -> Duration {
        Duration::from_millis(self.trace_duration_ms)
    }

    pub fn pulse_period(&self) -> Duration {
        Duration::from_millis(self.pulse_period_ms)
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: default_highlight_color(),
            glow_color: default_highlight_glow_color(),
            glow_size: default_highlight_glow_size(),
            line_width: default_line_width(),
            trace_duration_ms: default_trace_duration_ms(),
            pulse_min_opacity: default_pulse_min_opacity(),
            pulse_max_opacity: default_pulse_max_opacity(),
            pulse_period_ms: default_highlight_pulse_period_ms(),
            pulse: true,
            label_font_px: default_label_font_px(),
            label_padding: default_label_padding(),
            label_gap: default_label_gap(),
            label_corner_radius: default_label_corner_radius(),
            label_background: default_label_background(),
            label_color: default_label_color(),
        }
    }
}

fn default_highlight_color() -> Rgba {
    Rgba::new(75, 75, 255, 0.6)
}

fn default_highlight_glow_color() -> Rgba {
    Rgba::new(75, 75, 255, 0.4)
}

fn default_highlight_glow_size() -> f64 {
    4.0
}

fn default_line_width() -> f64 {
    2.0
}

fn default_trace_duration_ms() -> u64 {
    1000
}

fn default_pulse_min_opacity() -> f64 {
    0.6
}

fn default_pulse_max_opacity() -> f64 {
    1.0
}

// 0.01 opacity per 16 ms frame across 0.4 and back.
fn default_highlight_pulse_period_ms() -> u64 {
    1330
}

fn default_label_font_px() -> f64 {
    12.0
}

fn default_label_padding() -> f64 {
    8.0
}

fn default_label_gap() -> f64 {
    8.0
}

fn default_label_corner_radius() -> f64 {
    6.0
}

fn default_label_background() -> Rgba {
    Rgba::new(0, 0, 0, 0.8)
}

fn default_label_color() -> Rgba {
    Rgba::new(255, 255, 255, 1.0)
}
