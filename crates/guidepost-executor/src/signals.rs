//! Merges page events and caller controls into one stream.

use guidepost_protocols::{ListenerGuard, PageEvent, Subscription};
use tokio::sync::mpsc;

/// Out-of-band instructions from whoever started the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Complete the wait as if the user had interacted.
    Advance,
    /// Abort the run.
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Page(PageEvent),
    Control(Control),
    /// The page side went away.
    Closed,
}

/// One run's view of everything that can end the interaction wait.
pub struct InteractionSignals {
    events: mpsc::UnboundedReceiver<PageEvent>,
    controls: mpsc::UnboundedReceiver<Control>,
    guard: Option<ListenerGuard>,
}

impl InteractionSignals {
    pub fn new(subscription: Subscription, controls: mpsc::UnboundedReceiver<Control>) -> Self {
        let (events, guard) = subscription.into_parts();
        Self {
            events,
            controls,
            guard: Some(guard),
        }
    }

    /// Hand the listener guard to someone else, typically a cleanup stack.
    pub fn take_guard(&mut self) -> Option<ListenerGuard> {
        self.guard.take()
    }

    /// Wait for the next signal. Controls take priority over page events.
    pub async fn next(&mut self) -> Signal {
        tokio::select! {
            biased;
            Some(control) = self.controls.recv() => Signal::Control(control),
            event = self.events.recv() => match event {
                Some(event) => Signal::Page(event),
                None => Signal::Closed,
            },
        }
    }
}
