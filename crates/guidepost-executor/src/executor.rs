//! The workflow state machine.
//!
//! One run at a time: locate the target, bring it into view, glide the
//! cursor onto it, trace a highlight, then wait for the user (or a
//! synthetic signal) to interact with exactly that element. Whatever
//! happens, overlays and page listeners are torn down once and the
//! caller's completion callback fires once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use guidepost_config::GuideConfig;
use guidepost_overlay::{CursorRenderer, HighlightRenderer};
use guidepost_protocols::{
    FrameClock, Layer, ListenSpec, OverlayError, Page, PageEvent, PointerKind, SurfaceProvider,
    TargetDescriptor,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cleanup::CleanupStack;
use crate::error::ExecutorError;
use crate::locator::{ElementLocator, Located};
use crate::report::{AbortReason, Phase, RunOutcome, RunReport, Trigger};
use crate::scroller::ViewportScroller;
use crate::selection::SelectionLog;
use crate::signals::{Control, InteractionSignals, Signal};

/// How a signal bears on the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Ignore,
    Complete(Trigger),
    Abort(AbortReason),
}

/// Overlays acquired for one run.
struct Overlays {
    cursor: Arc<CursorRenderer>,
    highlight: Arc<HighlightRenderer>,
}

/// Per-run bookkeeping. Dropping it releases the executor even if the
/// run future is abandoned midway.
struct Run<'a> {
    executor: &'a WorkflowExecutor,
    report: RunReport,
    cleanup: CleanupStack,
    started: Instant,
}

impl<'a> Run<'a> {
    fn new(executor: &'a WorkflowExecutor, identifier: &str) -> Self {
        Self {
            executor,
            report: RunReport::new(identifier),
            cleanup: CleanupStack::new(),
            started: Instant::now(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(identifier = %self.report.identifier, phase = %phase, "Phase transition");
        self.report.phases.push(phase);
        self.executor.phase.send_replace(phase);
    }

    fn record(&mut self, located: &Located) {
        self.report.bounds = Some(located.bounds);
        self.report.strategy = Some(located.strategy);
    }

    /// Tear down and produce the final report.
    fn finish(&mut self, outcome: RunOutcome) -> RunReport {
        self.report.selections = self.executor.selections.snapshot();
        self.report.cleanup_handlers_run = self.cleanup.run_all();
        self.report.outcome = outcome;
        self.report.phases.push(Phase::Idle);
        self.report.elapsed = self.started.elapsed();
        self.report.clone()
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        self.cleanup.run_all();
        self.executor.control.lock().take();
        self.executor.phase.send_replace(Phase::Idle);
        self.executor.active.store(false, Ordering::SeqCst);
    }
}

/// Drives single-target guidance runs against a page.
pub struct WorkflowExecutor {
    page: Arc<dyn Page>,
    surfaces: Arc<dyn SurfaceProvider>,
    clock: Arc<dyn FrameClock>,
    config: Arc<GuideConfig>,
    locator: ElementLocator,
    scroller: ViewportScroller,
    selections: Arc<SelectionLog>,
    active: AtomicBool,
    phase: watch::Sender<Phase>,
    control: Mutex<Option<mpsc::UnboundedSender<Control>>>,
}

impl WorkflowExecutor {
    pub fn new(
        page: Arc<dyn Page>,
        surfaces: Arc<dyn SurfaceProvider>,
        clock: Arc<dyn FrameClock>,
        config: Arc<GuideConfig>,
    ) -> Self {
        let locator = ElementLocator::new(page.clone(), config.executor.automation_attribute.clone());
        let scroller = ViewportScroller::new(page.clone(), clock.clone(), config.scroll.clone());
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            page,
            surfaces,
            clock,
            config,
            locator,
            scroller,
            selections: Arc::new(SelectionLog::new()),
            active: AtomicBool::new(false),
            phase,
            control: Mutex::new(None),
        }
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    pub fn selections(&self) -> Arc<SelectionLog> {
        self.selections.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn phases(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Complete the current interaction wait as if the user had acted.
    /// Returns false when no run is listening.
    pub fn advance(&self) -> bool {
        self.send_control(Control::Advance)
    }

    /// Abort the current run. Returns false when no run is active.
    pub fn cancel(&self) -> bool {
        self.send_control(Control::Cancel)
    }

    fn send_control(&self, control: Control) -> bool {
        self.control
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(control).is_ok())
    }

    pub async fn execute(&self, target: impl Into<TargetDescriptor>) -> Result<RunReport, ExecutorError> {
        self.execute_with(target, |_| {}).await
    }

    /// Run one workflow and invoke `on_complete` exactly once when it ends.
    ///
    /// Only [`ExecutorError::Busy`] is returned as an error; every other
    /// failure is reported through [`RunReport::outcome`].
    pub async fn execute_with<F>(
        &self,
        target: impl Into<TargetDescriptor>,
        on_complete: F,
    ) -> Result<RunReport, ExecutorError>
    where
        F: FnOnce(&RunReport) + Send,
    {
        let target = target.into();
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(identifier = %target.identifier, "Rejecting run while another is active");
            return Err(ExecutorError::Busy(target.identifier));
        }

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        *self.control.lock() = Some(control_tx);

        let mut run = Run::new(self, &target.identifier);
        let selections = self.selections.clone();
        run.cleanup.register("selections", move || selections.clear());
        info!(identifier = %target.identifier, "Workflow run started");

        let outcome = match self.drive(&mut run, &target, control_rx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(identifier = %target.identifier, error = %e, "Workflow run failed");
                run.enter(Phase::Error);
                RunOutcome::Failed { error: e.to_string() }
            }
        };

        let report = run.finish(outcome);
        info!(
            identifier = %report.identifier,
            outcome = ?report.outcome,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Workflow run finished"
        );
        on_complete(&report);
        drop(run);
        Ok(report)
    }

    async fn drive(
        &self,
        run: &mut Run<'_>,
        target: &TargetDescriptor,
        controls: mpsc::UnboundedReceiver<Control>,
    ) -> Result<RunOutcome, ExecutorError> {
        run.enter(Phase::Locating);
        let located = self.locator.locate(&target.identifier).await?;
        run.record(&located);

        let overlays = self.acquire_overlays(run).await?;

        // Listeners go live before anything is revealed.
        let subscription = self.page.listen(self.listen_spec()).await?;
        let mut signals = InteractionSignals::new(subscription, controls);
        if let Some(guard) = signals.take_guard() {
            run.cleanup.register("listeners", move || guard.release());
        }

        let mut early = None;
        let approached = {
            let approach = self.approach(run, located, target, &overlays);
            tokio::pin!(approach);
            loop {
                tokio::select! {
                    result = &mut approach => break Ok(result),
                    signal = signals.next() => match self.judge(&signal, &target.identifier) {
                        Verdict::Ignore => {}
                        Verdict::Complete(trigger) => {
                            debug!(?trigger, "Interaction arrived before the target was revealed");
                            early.get_or_insert(trigger);
                        }
                        Verdict::Abort(reason) => break Err(reason),
                    },
                }
            }
        };

        let verdict = match approached {
            Err(reason) => Verdict::Abort(reason),
            Ok(result) => {
                let located = result?;
                run.enter(Phase::AwaitingInteraction);
                let verdict = match early {
                    Some(trigger) => Verdict::Complete(trigger),
                    None if !target.requires_interaction => {
                        overlays.cursor.click().await?;
                        self.page.click(&located.node).await?;
                        Verdict::Complete(Trigger::AutoClick)
                    }
                    None => self.await_interaction(&mut signals, &target.identifier).await,
                };
                if verdict == Verdict::Complete(Trigger::AdvanceKey) {
                    debug!(identifier = %target.identifier, "Advance key pressed, clicking target");
                    self.page.click(&located.node).await?;
                }
                verdict
            }
        };

        let outcome = match verdict {
            Verdict::Complete(trigger) => RunOutcome::Completed { trigger },
            Verdict::Abort(reason) => {
                info!(identifier = %target.identifier, %reason, "Workflow run aborted");
                RunOutcome::Aborted { reason }
            }
            Verdict::Ignore => RunOutcome::Aborted {
                reason: AbortReason::SignalsClosed,
            },
        };

        self.complete(run, &overlays, outcome.is_completed()).await?;
        Ok(outcome)
    }

    async fn acquire_overlays(&self, run: &mut Run<'_>) -> Result<Overlays, ExecutorError> {
        let highlight_surface = self.surfaces.create_surface(Layer::Highlight).await?;
        let highlight = Arc::new(HighlightRenderer::new(
            highlight_surface,
            self.clock.clone(),
            self.config.highlight.clone(),
        ));
        let handle = highlight.clone();
        run.cleanup.register("highlight", move || handle.destroy());

        let cursor_surface = self.surfaces.create_surface(Layer::Cursor).await?;
        let cursor = Arc::new(CursorRenderer::new(
            cursor_surface,
            self.clock.clone(),
            self.config.cursor.clone(),
        ));
        let handle = cursor.clone();
        run.cleanup.register("cursor", move || handle.destroy());

        Ok(Overlays { cursor, highlight })
    }

    /// Park, scroll if needed, glide onto the target and reveal the
    /// highlight. Returns the geometry the highlight was drawn at.
    async fn approach(
        &self,
        run: &mut Run<'_>,
        mut located: Located,
        target: &TargetDescriptor,
        overlays: &Overlays,
    ) -> Result<Located, ExecutorError> {
        let viewport = self.page.viewport().await?;
        overlays
            .cursor
            .set_position(viewport.parked_position(self.config.executor.parked_margin))?;

        if !located.in_viewport {
            run.enter(Phase::Scrolling);
            let outcome = self.scroller.scroll_into_view(&self.locator, &located).await?;
            run.report.scrolled = true;
            run.report.scroll_timed_out = outcome.timed_out;
            located = outcome.located;
            run.record(&located);
            if !located.in_viewport {
                warn!(
                    identifier = %located.identifier,
                    bounds = ?located.bounds,
                    "Target still outside the viewport after scrolling, continuing"
                );
            }
        }

        run.enter(Phase::Moving);
        overlays.cursor.move_to(located.bounds.center()).await?;

        run.enter(Phase::Highlighted);
        tokio::time::sleep(self.config.executor.highlight_delay()).await;

        // The glide and the delay both give the page time to reflow.
        let fresh = self.relocate(&located).await;
        if fresh.bounds != located.bounds {
            debug!(
                identifier = %fresh.identifier,
                from = ?located.bounds,
                to = ?fresh.bounds,
                "Target moved during approach, following it"
            );
            overlays.cursor.move_to(fresh.bounds.center()).await?;
            run.record(&fresh);
        }
        let located = fresh;

        overlays.highlight.show(located.bounds, &target.label)?;
        Ok(located)
    }

    /// Fresh geometry for `located`, or `located` itself when the lookup
    /// no longer succeeds.
    async fn relocate(&self, located: &Located) -> Located {
        match self.locator.locate(&located.identifier).await {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(
                    identifier = %located.identifier,
                    error = %e,
                    "Re-locate before highlighting failed, keeping previous geometry"
                );
                located.clone()
            }
        }
    }

    async fn await_interaction(&self, signals: &mut InteractionSignals, identifier: &str) -> Verdict {
        loop {
            let signal = signals.next().await;
            match self.judge(&signal, identifier) {
                Verdict::Ignore => continue,
                verdict => return verdict,
            }
        }
    }

    /// Decide what `signal` means for the run targeting `identifier`.
    fn judge(&self, signal: &Signal, identifier: &str) -> Verdict {
        let event = match signal {
            Signal::Control(Control::Advance) => return Verdict::Complete(Trigger::ForcedAdvance),
            Signal::Control(Control::Cancel) => return Verdict::Abort(AbortReason::Cancelled),
            Signal::Closed => return Verdict::Abort(AbortReason::SignalsClosed),
            Signal::Page(event) => event,
        };

        self.selections.observe(event);
        match event {
            PageEvent::VisibilityHidden => Verdict::Abort(AbortReason::VisibilityHidden),
            PageEvent::Unload => Verdict::Abort(AbortReason::Unload),
            PageEvent::Pointer { path, .. } if path.iter().any(|keys| keys.matches(identifier)) => {
                Verdict::Complete(Trigger::Pointer)
            }
            PageEvent::Attribute(mutation) if mutation.target.matches(identifier) => {
                Verdict::Complete(Trigger::Attribute)
            }
            PageEvent::Key { key, .. } if *key == self.config.executor.advance_key => {
                Verdict::Complete(Trigger::AdvanceKey)
            }
            _ => Verdict::Ignore,
        }
    }

    /// Hide the highlight, then the cursor, pausing between steps.
    async fn complete(
        &self,
        run: &mut Run<'_>,
        overlays: &Overlays,
        interacted: bool,
    ) -> Result<(), ExecutorError> {
        run.enter(Phase::Completing);
        let timing = &self.config.executor;
        if interacted {
            tokio::time::sleep(timing.interaction_settle()).await;
        }
        tolerate_surface(overlays.highlight.hide(), Layer::Highlight)?;
        tokio::time::sleep(timing.hide_gap()).await;
        tolerate_surface(overlays.cursor.hide(), Layer::Cursor)?;
        tokio::time::sleep(timing.exit_wait()).await;
        Ok(())
    }

    fn listen_spec(&self) -> ListenSpec {
        let executor = &self.config.executor;
        ListenSpec {
            automation_attribute: executor.automation_attribute.clone(),
            pointer_events: vec![PointerKind::Click, PointerKind::PointerDown],
            intercept_keys: vec![executor.advance_key.clone()],
            watched_attributes: executor.attribute_filter(),
        }
    }
}

/// A surface that fails to clear during teardown (e.g. after navigation)
/// is not worth failing the run over; a destroyed renderer is.
fn tolerate_surface(result: Result<(), OverlayError>, layer: Layer) -> Result<(), OverlayError> {
    match result {
        Err(OverlayError::Surface(message)) => {
            warn!(layer = layer.as_str(), %message, "Could not clear overlay");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
