//! # Guidepost Session
//!
//! The loop around the executor. Each iteration captures the page,
//! asks a reasoning service for the next step and guides the user to the
//! first element it names, until the task is reported done.

pub mod annotate;
pub mod context;
pub mod error;
pub mod reasoning;
pub mod reply;
pub mod sanitize;
pub mod session;

pub use annotate::{
    AncestorSnapshot, ElementSnapshot, IdMinter, annotate, descriptive_id, element_label,
    is_interactive,
};
pub use context::{InteractiveElement, PageContext, PageContextProvider};
pub use error::SessionError;
pub use reasoning::{HttpReasoningService, ReasoningService, StepReply, StepRequest};
pub use reply::{ReasoningReply, parse_reply};
pub use sanitize::sanitize_markup;
pub use session::{GuidanceSession, SessionEvent, SessionOutcome};
