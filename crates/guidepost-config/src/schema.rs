//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_overlay;
mod schema_runtime;

pub use schema_overlay::*;
pub use schema_runtime::*;

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default)]
    pub cursor: CursorConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
#[path = "schema/schema_tests.rs"]
mod tests;
