//! # Guidepost Executor
//!
//! Routes the user to one element at a time:
//!
//! - [`ElementLocator`] resolves an identifier through ordered fallback
//!   lookup strategies
//! - [`ViewportScroller`] smooth-scrolls and waits for the page to settle
//! - [`WorkflowExecutor`] runs the state machine from lookup to the user's
//!   interaction, owning overlays and listeners for the duration of a run
//!
//! Runs end in a [`RunReport`]; teardown goes through a [`CleanupStack`]
//! so it happens exactly once on every path.

pub mod cleanup;
pub mod error;
pub mod executor;
pub mod locator;
pub mod report;
pub mod scroller;
pub mod selection;
pub mod signals;

pub use cleanup::CleanupStack;
pub use error::{ExecutorError, LocateError, NotFoundReason};
pub use executor::WorkflowExecutor;
pub use locator::{ElementLocator, Located, LookupStrategy, css_escape};
pub use report::{AbortReason, Phase, RunOutcome, RunReport, Trigger};
pub use scroller::{ScrollOutcome, ScrollSettler, SettleStatus, ViewportScroller};
pub use selection::{SelectionLog, SelectionRecord};
pub use signals::{Control, InteractionSignals, Signal};
