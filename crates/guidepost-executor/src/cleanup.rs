//! Exactly-once teardown for everything a run acquires.

use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use tracing::{debug, error};

type Handler = Box<dyn FnOnce() + Send>;

struct Entry {
    name: &'static str,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    entries: Vec<Entry>,
    closed: bool,
}

/// LIFO stack of teardown handlers.
///
/// Handlers run at most once, in reverse registration order. A handler
/// that panics is logged and the rest still run. Once the stack has been
/// drained, further registrations run immediately so nothing acquired
/// late can leak.
#[derive(Default)]
pub struct CleanupStack {
    inner: Mutex<Inner>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &'static str, handler: impl FnOnce() + Send + 'static) {
        let mut inner = self.inner.lock();
        if inner.closed {
            drop(inner);
            debug!(handler = name, "Cleanup already ran, releasing immediately");
            run_guarded(name, Box::new(handler));
            return;
        }
        inner.entries.push(Entry {
            name,
            handler: Box::new(handler),
        });
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Drain and run every pending handler. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let entries = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            std::mem::take(&mut inner.entries)
        };
        let count = entries.len();
        for entry in entries.into_iter().rev() {
            run_guarded(entry.name, entry.handler);
        }
        if count > 0 {
            debug!(count, "Cleanup handlers ran");
        }
        count
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        self.run_all();
    }
}

fn run_guarded(name: &'static str, handler: Handler) {
    if panic::catch_unwind(AssertUnwindSafe(handler)).is_err() {
        error!(handler = name, "Cleanup handler panicked");
    }
}
