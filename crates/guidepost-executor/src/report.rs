//! Run phases and the summary handed back when a run ends.

use std::fmt;
use std::time::Duration;

use guidepost_protocols::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::locator::LookupStrategy;
use crate::selection::SelectionRecord;

/// Workflow executor states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Locating,
    Scrolling,
    Moving,
    Highlighted,
    AwaitingInteraction,
    Completing,
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Locating => "locating",
            Phase::Scrolling => "scrolling",
            Phase::Moving => "moving",
            Phase::Highlighted => "highlighted",
            Phase::AwaitingInteraction => "awaiting-interaction",
            Phase::Completing => "completing",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What ended the interaction wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A pointer event on the target or a descendant.
    Pointer,
    /// A watched attribute changed on the target.
    Attribute,
    /// The advance key synthesized a click.
    AdvanceKey,
    /// [`WorkflowExecutor::advance`](crate::WorkflowExecutor::advance).
    ForcedAdvance,
    /// The target did not require interaction; the executor clicked it.
    AutoClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    VisibilityHidden,
    Unload,
    Cancelled,
    SignalsClosed,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbortReason::VisibilityHidden => "page hidden",
            AbortReason::Unload => "page unloaded",
            AbortReason::Cancelled => "cancelled",
            AbortReason::SignalsClosed => "signals closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { trigger: Trigger },
    Aborted { reason: AbortReason },
    Failed { error: String },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RunOutcome::Aborted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Summary of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub identifier: String,
    pub outcome: RunOutcome,
    /// Every phase entered, in order, ending with [`Phase::Idle`].
    pub phases: Vec<Phase>,
    /// Last known geometry of the target.
    pub bounds: Option<BoundingBox>,
    pub strategy: Option<LookupStrategy>,
    pub scrolled: bool,
    pub scroll_timed_out: bool,
    pub cleanup_handlers_run: usize,
    pub selections: Vec<SelectionRecord>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            outcome: RunOutcome::Failed {
                error: "run did not finish".to_string(),
            },
            phases: Vec::new(),
            bounds: None,
            strategy: None,
            scrolled: false,
            scroll_timed_out: false,
            cleanup_handlers_run: 0,
            selections: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn visited(&self, phase: Phase) -> bool {
        self.phases.contains(&phase)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::AwaitingInteraction.to_string(), "awaiting-interaction");
        assert_eq!(
            serde_json::to_value(Phase::AwaitingInteraction).unwrap(),
            "awaiting-interaction"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(RunOutcome::Aborted {
            reason: AbortReason::VisibilityHidden,
        })
        .unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["reason"], "visibility_hidden");
    }

    #[test]
    fn test_report_elapsed_in_millis() {
        let mut report = RunReport::new("buy");
        report.elapsed = Duration::from_millis(1500);
        report.phases = vec![Phase::Locating, Phase::Error, Phase::Idle];
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed"], 1500);
        assert!(report.visited(Phase::Error));
        assert!(!report.visited(Phase::Moving));
    }
}
