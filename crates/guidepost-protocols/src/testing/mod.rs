//! In-memory doubles for the page and overlay ports.

mod fake_page;
mod recording_surface;

pub use fake_page::{FakeElement, FakePage, ScrollMode};
pub use recording_surface::{RecordingSurface, RecordingSurfaceProvider, SurfaceCall};
