//! Executor, scrolling, session, browser and logging configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Workflow executor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Dedicated attribute tried first when resolving an identifier.
    #[serde(default = "default_automation_attribute")]
    pub automation_attribute: String,

    /// Key that synthesizes a click on the target while awaiting interaction.
    #[serde(default = "default_advance_key")]
    pub advance_key: String,

    /// Attributes whose mutation can signal selection or expansion.
    /// The automation attribute is always watched in addition.
    #[serde(default = "default_watched_attributes")]
    pub watched_attributes: Vec<String>,

    #[serde(default = "default_highlight_delay_ms")]
    pub highlight_delay_ms: u64,

    /// Pause after a matching interaction before overlays start hiding.
    #[serde(default = "default_interaction_settle_ms")]
    pub interaction_settle_ms: u64,

    /// Between hiding the highlight and hiding the cursor.
    #[serde(default = "default_hide_gap_ms")]
    pub hide_gap_ms: u64,

    /// After hiding the cursor, before cleanup.
    #[serde(default = "default_exit_wait_ms")]
    pub exit_wait_ms: u64,

    /// Inset of the parked cursor from the bottom-right corner.
    #[serde(default = "default_parked_margin")]
    pub parked_margin: f64,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl ExecutorConfig {
    pub fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }

    pub fn interaction_settle(&self) -> Duration {
        Duration::from_millis(self.interaction_settle_ms)
    }

    pub fn hide_gap(&self) -> Duration {
        Duration::from_millis(self.hide_gap_ms)
    }

    pub fn exit_wait(&self) -> Duration {
        Duration::from_millis(self.exit_wait_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Watched attributes with the automation attribute folded in, deduplicated.
    pub fn attribute_filter(&self) -> Vec<String> {
        let mut filter = self.watched_attributes.clone();
        if !filter.contains(&self.automation_attribute) {
            filter.push(self.automation_attribute.clone());
        }
        filter
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            automation_attribute: default_automation_attribute(),
            advance_key: default_advance_key(),
            watched_attributes: default_watched_attributes(),
            highlight_delay_ms: default_highlight_delay_ms(),
            interaction_settle_ms: default_interaction_settle_ms(),
            hide_gap_ms: default_hide_gap_ms(),
            exit_wait_ms: default_exit_wait_ms(),
            parked_margin: default_parked_margin(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_automation_attribute() -> String {
    "data-guide-id".to_string()
}

fn default_advance_key() -> String {
    "Tab".to_string()
}

fn default_watched_attributes() -> Vec<String> {
    ["aria-selected", "aria-expanded", "class", "id", "data-testid", "name"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_highlight_delay_ms() -> u64 {
    50
}

fn default_interaction_settle_ms() -> u64 {
    100
}

fn default_hide_gap_ms() -> u64 {
    200
}

fn default_exit_wait_ms() -> u64 {
    300
}

fn default_parked_margin() -> f64 {
    100.0
}

fn default_frame_interval_ms() -> u64 {
    16
}

/// Viewport scroller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Where the element's top lands, as a fraction of viewport height.
    #[serde(default = "default_viewport_fraction")]
    pub viewport_fraction: f64,

    /// Consecutive unchanged polls that count as settled.
    #[serde(default = "default_stable_frames")]
    pub stable_frames: u32,

    /// Hard ceiling on waiting for the scroll to settle.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Movement below this many pixels counts as unchanged.
    #[serde(default = "default_epsilon_px")]
    pub epsilon_px: f64,
}

impl ScrollConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            viewport_fraction: default_viewport_fraction(),
            stable_frames: default_stable_frames(),
            settle_timeout_ms: default_settle_timeout_ms(),
            epsilon_px: default_epsilon_px(),
        }
    }
}

fn default_viewport_fraction() -> f64 {
    0.25
}

fn default_stable_frames() -> u32 {
    3
}

fn default_settle_timeout_ms() -> u64 {
    3000
}

fn default_epsilon_px() -> f64 {
    0.5
}

/// How the outer loop treats a reported `taskAccomplished`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    /// Stop on the first reply that says the task is done.
    #[default]
    TrustReported,
    /// Re-capture the page and require a second consecutive confirmation.
    ConfirmWithFreshContext,
}

/// Outer guidance loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Reasoning service endpoint.
    #[serde(default = "default_analyze_url")]
    pub analyze_url: String,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub verification: VerificationPolicy,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional site map forwarded to the reasoning service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<String>,

    /// Element ids stripped from serialized markup before it is sent.
    #[serde(default = "default_excluded_ids")]
    pub excluded_ids: Vec<String>,
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            analyze_url: default_analyze_url(),
            max_iterations: default_max_iterations(),
            verification: VerificationPolicy::default(),
            request_timeout_secs: default_request_timeout_secs(),
            sitemap: None,
            excluded_ids: default_excluded_ids(),
        }
    }
}

fn default_analyze_url() -> String {
    "http://localhost:3000/analyze".to_string()
}

fn default_max_iterations() -> u32 {
    20
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_excluded_ids() -> Vec<String> {
    vec!["chat-widget".to_string()]
}

/// Browser connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging HTTP endpoint.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,

    /// Attach to the first page whose URL contains this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url_contains: Option<String>,

    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl BrowserConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
            page_url_contains: None,
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

fn default_call_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the daily rolling log file.
    #[serde(default = "default_log_directory")]
    pub directory: String,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,

    /// Emit JSON lines to the log file instead of plain text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "~/.guidepost/logs".to_string()
}

fn default_log_file_prefix() -> String {
    "guidepost.log".to_string()
}
