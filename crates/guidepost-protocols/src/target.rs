//! The element a workflow step routes the user to.

use serde::{Deserialize, Serialize};

fn default_requires_interaction() -> bool {
    true
}

/// Identifies one DOM element for a single workflow run.
///
/// Replaced, never mutated, when a new step starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Opaque identifier resolved through the locator's fallback strategies.
    pub identifier: String,
    /// When false the executor clicks the element itself instead of
    /// waiting for the user.
    #[serde(default = "default_requires_interaction")]
    pub requires_interaction: bool,
    /// Optional text drawn beneath the highlight. Empty means none.
    #[serde(default)]
    pub label: String,
}

impl TargetDescriptor {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            requires_interaction: true,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn auto_click(mut self) -> Self {
        self.requires_interaction = false;
        self
    }
}

impl From<&str> for TargetDescriptor {
    fn from(identifier: &str) -> Self {
        Self::new(identifier)
    }
}

impl From<String> for TargetDescriptor {
    fn from(identifier: String) -> Self {
        Self::new(identifier)
    }
}
