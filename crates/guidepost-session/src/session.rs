//! The outer loop: look at the page, ask for a step, guide the user
//! through it, repeat.

use std::sync::Arc;

use guidepost_config::{SessionConfig, VerificationPolicy};
use guidepost_executor::{RunReport, WorkflowExecutor};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::context::PageContextProvider;
use crate::error::SessionError;
use crate::reasoning::{ReasoningService, StepRequest};
use crate::sanitize::sanitize_markup;

const EVENT_CAPACITY: usize = 64;

/// Progress published while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Thinking { iteration: u32 },
    Narration(String),
    StepStarted { identifier: String },
    StepFinished(Box<RunReport>),
    /// The service reported success; waiting for a second look.
    Verifying,
    Accomplished { iterations: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Accomplished { iterations: u32 },
    /// Gave up after the configured number of iterations.
    IterationLimit { iterations: u32 },
}

/// Drives a user's request through as many guided steps as it takes.
pub struct GuidanceSession {
    context: Arc<dyn PageContextProvider>,
    reasoning: Arc<dyn ReasoningService>,
    executor: Arc<WorkflowExecutor>,
    config: SessionConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl GuidanceSession {
    pub fn new(
        context: Arc<dyn PageContextProvider>,
        reasoning: Arc<dyn ReasoningService>,
        executor: Arc<WorkflowExecutor>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            context,
            reasoning,
            executor,
            config,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn executor(&self) -> &Arc<WorkflowExecutor> {
        &self.executor
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Guide the user towards `query` until the reasoning service says the
    /// task is done or the iteration limit is hit.
    pub async fn assist(&self, query: &str) -> Result<SessionOutcome, SessionError> {
        info!(query, policy = ?self.config.verification, "Guidance session started");
        let mut previous_messages: Vec<Value> = Vec::new();
        let mut awaiting_confirmation = false;

        for iteration in 0..self.config.max_iterations {
            self.publish(SessionEvent::Thinking { iteration });
            let context = self.context.capture().await?;
            debug!(
                iteration,
                interactive = context.interactive_elements.len(),
                "Captured page context"
            );

            let request = StepRequest {
                user_query: query.to_string(),
                screenshot: context.screenshot,
                dom_string: sanitize_markup(&context.serialized_markup, &self.config.excluded_ids),
                previous_messages: previous_messages.clone(),
                sitemap: self.config.sitemap.clone(),
            };
            let step = self.reasoning.next_step(&request).await?;

            if step.reply.task_accomplished {
                let done = match self.config.verification {
                    VerificationPolicy::TrustReported => true,
                    VerificationPolicy::ConfirmWithFreshContext => awaiting_confirmation,
                };
                if done {
                    let iterations = iteration + 1;
                    info!(iterations, "Task accomplished");
                    self.publish(SessionEvent::Accomplished { iterations });
                    return Ok(SessionOutcome::Accomplished { iterations });
                }
                debug!(iteration, "Task reported done, confirming with a fresh capture");
                awaiting_confirmation = true;
                self.publish(SessionEvent::Verifying);
                previous_messages = step.messages;
                continue;
            }
            awaiting_confirmation = false;

            self.publish(SessionEvent::Narration(step.reply.message().to_string()));

            match step.reply.next_action() {
                Some(identifier) => {
                    self.publish(SessionEvent::StepStarted {
                        identifier: identifier.to_string(),
                    });
                    let report = self.executor.execute(identifier).await?;
                    if !report.outcome.is_completed() {
                        warn!(identifier, outcome = ?report.outcome, "Step did not complete");
                    }
                    self.publish(SessionEvent::StepFinished(Box::new(report)));
                }
                None => debug!(iteration, "Reply carried no action"),
            }

            previous_messages = step.messages;
        }

        warn!(iterations = self.config.max_iterations, "Iteration limit reached");
        Ok(SessionOutcome::IterationLimit {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
