//! # Guidepost Protocols
//!
//! Core types and port definitions shared by the guidepost crates.
//! Contains only data types and interfaces, plus in-memory doubles behind
//! the `testing` feature.
//!
//! ## Ports
//!
//! - [`Page`] - The live document: selector queries, geometry, scrolling,
//!   synthetic clicks and event subscriptions
//! - [`Surface`] - A full-viewport drawable overlay owned by one renderer
//! - [`SurfaceProvider`] - Creates one [`Surface`] per overlay [`Layer`]
//! - [`FrameClock`] - The animation-frame tick every loop awaits

pub mod error;
pub mod geometry;
pub mod page;
pub mod scene;
pub mod surface;
pub mod target;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{OverlayError, PageError};
pub use geometry::{BoundingBox, Point, Size, Viewport};
pub use page::{
    AttributeMutation, ElementKeys, ListenSpec, ListenerGuard, NodeRef, Page, PageEvent,
    PointerKind, ScrollBehavior, Subscription,
};
pub use scene::{Rgba, Scene, Shape};
pub use surface::{FrameClock, Layer, OVERLAY_ATTRIBUTE, Surface, SurfaceProvider};
pub use target::TargetDescriptor;
