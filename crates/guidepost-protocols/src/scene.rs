//! Display lists drawn by the overlay renderers.
//!
//! A renderer builds one [`Scene`] per frame and hands it to its
//! [`Surface`](crate::Surface). Scenes serialize to JSON so remote
//! surfaces can replay them onto a canvas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};

/// An sRGB colour with straight alpha.
///
/// Serialized as a CSS colour string such as `rgba(75, 75, 255, 0.8)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    /// Same colour with alpha multiplied by `factor`.
    pub fn fade(self, factor: f64) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Same colour with alpha replaced.
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| format!("invalid hex colour: {}", s));
        }

        let (body, with_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(format!("unsupported colour syntax: {}", s));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| format!("unterminated colour: {}", s))?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if with_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(format!("expected {} components in {}", expected, s));
        }

        let channel = |p: &str| {
            p.parse::<u8>()
                .map_err(|_| format!("invalid colour channel '{}' in {}", p, s))
        };
        let a = if with_alpha {
            let a: f64 = parts[3]
                .parse()
                .map_err(|_| format!("invalid alpha '{}' in {}", parts[3], s))?;
            if !(0.0..=1.0).contains(&a) {
                return Err(format!("alpha out of range in {}", s));
            }
            a
        } else {
            1.0
        };

        Ok(Rgba::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, 1.0))
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(value: Rgba) -> Self {
        value.to_string()
    }
}

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Filled disc.
    Circle {
        center: Point,
        radius: f64,
        fill: Rgba,
    },
    /// Radial gradient from `color` at the centre to transparent at `radius`.
    Glow {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    /// Stroked circle outline.
    Ring {
        center: Point,
        radius: f64,
        stroke: Rgba,
        line_width: f64,
    },
    /// Connected line segments, optionally closed, with a soft shadow.
    Polyline {
        points: Vec<Point>,
        stroke: Rgba,
        line_width: f64,
        closed: bool,
        shadow_blur: f64,
    },
    /// Rounded text badge.
    Label {
        rect: BoundingBox,
        text: String,
        background: Rgba,
        color: Rgba,
        font_px: f64,
        corner_radius: f64,
    },
}

/// Ordered shapes for a single frame, painted back to front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }
}

impl FromIterator<Shape> for Scene {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
