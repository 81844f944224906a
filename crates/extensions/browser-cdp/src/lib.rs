//! # Guidepost Browser (CDP)
//!
//! Runs guidepost against a real Chrome tab over the Chrome DevTools
//! Protocol.
//!
//! - [`CdpPage`] implements the [`Page`](guidepost_protocols::Page) port
//! - [`CdpSurfaceProvider`] draws overlays on injected canvases
//! - [`CdpContextProvider`] captures the page for the reasoning service
//!
//! All three share one [`PageSession`] and install the same page scripts
//! on first use.

pub mod cdp;
mod context;
mod page;
mod scripts;
mod surface;

pub use cdp::{CdpClient, CdpError, CdpEvent, PageSession};
pub use context::CdpContextProvider;
pub use page::CdpPage;
pub use scripts::SIGNAL_BINDING;
pub use surface::{CdpSurface, CdpSurfaceProvider};
