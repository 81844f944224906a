//! # Guidepost Overlay
//!
//! The two visual indicators drawn above the page:
//!
//! - [`CursorRenderer`] - a synthetic pointer that glides between points,
//!   pulses while idle and squishes on click
//! - [`HighlightRenderer`] - an outline that traces an element's box,
//!   then breathes until hidden
//!
//! Both render [`Scene`](guidepost_protocols::Scene)s onto a
//! [`Surface`](guidepost_protocols::Surface), pacing every animation on a
//! [`FrameClock`](guidepost_protocols::FrameClock).

pub mod clock;
pub mod cursor;
pub mod easing;
pub mod highlight;

pub use clock::TickerClock;
pub use cursor::{CursorMode, CursorRenderer};
pub use highlight::{HighlightRenderer, HighlightState};
